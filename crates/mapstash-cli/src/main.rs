// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use mapstash_app::{City, ItemFormInput, ItemId, ItemStore, ListViewState, Region, SortMode};
use mapstash_db::Store;
use runtime::{AlwaysConfirm, LineNotices, ListRequest, PromptConfirm};
use std::env;
use std::io;
use std::path::PathBuf;
use time::OffsetDateTime;
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `mapstash --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    let _log_guard = logging::init(config.log_level(), &config.log_dir()?)?;
    info!(db = %db_path.display(), demo = options.demo, "starting mapstash");

    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or MAPSTASH_DB_PATH",
            db_path.display()
        )
    })?;
    store.bootstrap()?;
    if options.demo {
        store.seed_demo_data()?;
    }
    if options.check_only {
        return Ok(());
    }

    let mut items = ItemStore::new(store);
    match options.command {
        None => {
            let mut view =
                ListViewState::with_defaults(config.default_sort(), config.default_region());
            mapstash_tui::run_app(&mut view, &mut items)
        }
        Some(Command::List(request)) => {
            let view = request.view(config.default_sort(), config.default_region())?;
            let stdout = io::stdout();
            runtime::list(&mut items, &view, request.json, &mut stdout.lock())?;
            Ok(())
        }
        Some(Command::Add(form)) => {
            let id = runtime::add(&mut items, form, OffsetDateTime::now_utc())?;
            println!("{id}");
            Ok(())
        }
        Some(Command::Delete { id, yes }) => {
            let mut notices = LineNotices::new(io::stderr());
            if yes {
                runtime::delete(&mut items, &id, &mut AlwaysConfirm, &mut notices)?;
            } else {
                let mut confirm =
                    PromptConfirm::new(id.as_str(), io::stdin().lock(), io::stderr());
                runtime::delete(&mut items, &id, &mut confirm, &mut notices)?;
            }
            Ok(())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    List(ListRequest),
    Add(ItemFormInput),
    Delete { id: ItemId, yes: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_db_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
    command: Option<Command>,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_db_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
        command: None,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-path" => {
                options.print_db_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            "list" => {
                options.command = Some(Command::List(parse_list_args(&mut iter)?));
            }
            "add" => {
                options.command = Some(Command::Add(parse_add_args(&mut iter)?));
            }
            "delete" => {
                options.command = Some(parse_delete_args(&mut iter)?);
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn flag_value<S: AsRef<str>>(iter: &mut impl Iterator<Item = S>, flag: &str) -> Result<String> {
    iter.next()
        .map(|value| value.as_ref().to_owned())
        .ok_or_else(|| anyhow!("{flag} requires a value"))
}

fn parse_list_args<S: AsRef<str>>(iter: &mut impl Iterator<Item = S>) -> Result<ListRequest> {
    let mut request = ListRequest::default();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--search" => request.search = Some(flag_value(iter, "--search")?),
            "--sort" => {
                let value = flag_value(iter, "--sort")?;
                let sort = SortMode::parse(&value).ok_or_else(|| {
                    anyhow!("unknown sort {value:?}; use newest, oldest or north_to_south")
                })?;
                request.sort = Some(sort);
            }
            "--region" => {
                let value = flag_value(iter, "--region")?;
                let region = Region::parse(&value).ok_or_else(|| {
                    anyhow!("unknown region {value:?}; use all, north, central or south")
                })?;
                request.region = Some(region);
            }
            "--city" => {
                let value = flag_value(iter, "--city")?;
                let city = City::parse(&value).ok_or_else(|| {
                    anyhow!("unknown city {value:?}; use one of {}", city_codes())
                })?;
                request.cities.push(city);
            }
            "--json" => request.json = true,
            unknown => bail!("unknown list argument {unknown:?}; run with --help for usage"),
        }
    }
    Ok(request)
}

fn parse_add_args<S: AsRef<str>>(iter: &mut impl Iterator<Item = S>) -> Result<ItemFormInput> {
    let mut form = ItemFormInput::default();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--url" => form.url = flag_value(iter, "--url")?,
            "--city" => form.city = flag_value(iter, "--city")?,
            "--name" => form.name = flag_value(iter, "--name")?,
            "--address" => form.address = flag_value(iter, "--address")?,
            "--category" => form.category = flag_value(iter, "--category")?,
            "--sub-category" => form.sub_category = flag_value(iter, "--sub-category")?,
            "--note" => form.note = flag_value(iter, "--note")?,
            unknown => bail!("unknown add argument {unknown:?}; run with --help for usage"),
        }
    }
    Ok(form)
}

fn parse_delete_args<S: AsRef<str>>(iter: &mut impl Iterator<Item = S>) -> Result<Command> {
    let mut id = None;
    let mut yes = false;
    for arg in iter {
        match arg.as_ref() {
            "--yes" | "-y" => yes = true,
            flag if flag.starts_with('-') => {
                bail!("unknown delete argument {flag:?}; run with --help for usage")
            }
            value if id.is_none() => id = Some(ItemId::new(value)),
            extra => bail!("unexpected extra argument {extra:?}; delete takes one id"),
        }
    }
    let id = id.ok_or_else(|| anyhow!("delete requires an item id; run `mapstash list` to see ids"))?;
    Ok(Command::Delete { id, yes })
}

fn city_codes() -> String {
    City::ALL
        .iter()
        .map(|city| city.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_help() {
    println!("mapstash [options] [command]");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Launch with seeded demo places (in-memory)");
    println!("  --check                  Validate config + DB, then exit");
    println!("  --help                   Show this help");
    println!();
    println!("commands (default: open the browser UI)");
    println!("  list [--search <text>] [--sort newest|oldest|north_to_south]");
    println!("       [--region all|north|central|south] [--city <code>]... [--json]");
    println!("  add --url <url> --city <code> [--name <n>] [--address <a>]");
    println!("      [--category <c>] [--sub-category <s>] [--note <n>]");
    println!("  delete <id> [--yes]");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, Command, parse_cli_args};
    use crate::runtime::ListRequest;
    use anyhow::Result;
    use mapstash_app::{City, ItemFormInput, ItemId, Region, SortMode};
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/mapstash-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                print_db_path: false,
                demo: false,
                print_example: false,
                check_only: false,
                show_help: false,
                command: None,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_config_value() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(!options.print_db_path);
        assert!(!options.demo);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        assert!(parse_cli_args(vec!["--help"], default_options_path())?.show_help);
        assert!(parse_cli_args(vec!["-h"], default_options_path())?.show_help);
        Ok(())
    }

    #[test]
    fn list_command_collects_filters() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--demo", "list", "--search", "麵", "--sort", "oldest", "--region", "north",
                "--city", "台北", "--city", "新北", "--json",
            ],
            default_options_path(),
        )?;
        assert!(options.demo);
        assert_eq!(
            options.command,
            Some(Command::List(ListRequest {
                search: Some("麵".to_owned()),
                sort: Some(SortMode::Oldest),
                region: Some(Region::North),
                cities: vec![City::Taipei, City::NewTaipei],
                json: true,
            }))
        );
        Ok(())
    }

    #[test]
    fn list_command_rejects_unknown_values() {
        let error = parse_cli_args(vec!["list", "--sort", "random"], default_options_path())
            .expect_err("bad sort");
        assert!(error.to_string().contains("unknown sort"));

        let error = parse_cli_args(vec!["list", "--city", "花蓮"], default_options_path())
            .expect_err("bad city");
        assert!(error.to_string().contains("台北"));

        let error = parse_cli_args(vec!["list", "--region"], default_options_path())
            .expect_err("missing region");
        assert!(error.to_string().contains("--region requires a value"));
    }

    #[test]
    fn add_command_fills_form_fields() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "add",
                "--url",
                "https://www.instagram.com/reel/x",
                "--city",
                "台南",
                "--name",
                "阿堂鹹粥",
                "--category",
                "food",
                "--sub-category",
                "rice",
            ],
            default_options_path(),
        )?;
        assert_eq!(
            options.command,
            Some(Command::Add(ItemFormInput {
                url: "https://www.instagram.com/reel/x".to_owned(),
                city: "台南".to_owned(),
                name: "阿堂鹹粥".to_owned(),
                category: "food".to_owned(),
                sub_category: "rice".to_owned(),
                ..ItemFormInput::default()
            }))
        );
        Ok(())
    }

    #[test]
    fn delete_command_takes_one_id_and_yes_flag() -> Result<()> {
        let options = parse_cli_args(vec!["delete", "abc", "--yes"], default_options_path())?;
        assert_eq!(
            options.command,
            Some(Command::Delete {
                id: ItemId::new("abc"),
                yes: true,
            })
        );

        let error = parse_cli_args(vec!["delete"], default_options_path())
            .expect_err("missing id");
        assert!(error.to_string().contains("requires an item id"));

        let error = parse_cli_args(vec!["delete", "a", "b"], default_options_path())
            .expect_err("two ids");
        assert!(error.to_string().contains("one id"));
        Ok(())
    }
}
