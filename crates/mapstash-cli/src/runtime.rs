// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use mapstash_app::{
    City, ConfirmPort, DeleteOutcome, Item, ItemCollection, ItemFormInput, ItemId, ItemStore,
    ListCommand, ListEvent, ListViewState, Notice, NotifyPort, Region, SortMode, address_link,
    place_link, place_link_with_city, visible_items,
};
use serde::Serialize;
use std::io::{BufRead, Write};
use time::OffsetDateTime;
use time::macros::format_description;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    pub search: Option<String>,
    pub sort: Option<SortMode>,
    pub region: Option<Region>,
    pub cities: Vec<City>,
    pub json: bool,
}

impl ListRequest {
    pub fn view(&self, default_sort: SortMode, default_region: Region) -> Result<ListViewState> {
        let mut view = ListViewState::with_defaults(
            self.sort.unwrap_or(default_sort),
            self.region.unwrap_or(default_region),
        );
        if let Some(search) = &self.search {
            view.dispatch(ListCommand::SetSearch(search.clone()));
        }
        for city in &self.cities {
            let events = view.dispatch(ListCommand::ToggleCity(*city));
            if events
                .iter()
                .any(|event| matches!(event, ListEvent::CityUnavailable(_)))
            {
                bail!(
                    "{} is not in {} -- pass a matching --region or drop --city {}",
                    city.as_str(),
                    view.region.label(),
                    city.as_str()
                );
            }
        }
        Ok(view)
    }
}

pub fn list<C: ItemCollection>(
    store: &mut ItemStore<C>,
    view: &ListViewState,
    json: bool,
    out: &mut impl Write,
) -> Result<usize> {
    store.load()?;
    let visible = visible_items(store.items(), view);
    if json {
        let listed = visible
            .iter()
            .map(|item| ListedPlace::new(item))
            .collect::<Result<Vec<_>>>()?;
        serde_json::to_writer_pretty(&mut *out, &listed).context("encode items as JSON")?;
        writeln!(out)?;
    } else {
        for item in &visible {
            writeln!(out, "{}", list_line(item))?;
        }
    }
    Ok(visible.len())
}

#[derive(Serialize)]
struct ListedPlace<'a> {
    #[serde(flatten)]
    item: &'a Item,
    map_link: String,
    city_map_link: String,
    address_map_link: Option<String>,
}

impl<'a> ListedPlace<'a> {
    fn new(item: &'a Item) -> Result<Self> {
        Ok(Self {
            item,
            map_link: place_link(item)?.into(),
            city_map_link: place_link_with_city(item)?.into(),
            address_map_link: address_link(item)?.map(String::from),
        })
    }
}

fn list_line(item: &Item) -> String {
    let saved = item
        .created_at
        .and_then(|at| at.format(format_description!("[year]-[month]-[day]")).ok())
        .unwrap_or_else(|| "-".to_owned());
    let city = item.city.map_or("-", City::as_str);
    let category = match (&item.category, item.category.as_ref().and_then(|c| c.sub_label())) {
        (Some(category), Some(sub)) => format!("{}/{}", category.label(), sub),
        (Some(category), None) => category.label().to_owned(),
        (None, _) => "-".to_owned(),
    };
    let link = place_link(item).map_or_else(|_| "-".to_owned(), String::from);
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}",
        item.id,
        saved,
        city,
        category,
        item.display_name(),
        link
    )
}

pub fn add<C: ItemCollection>(
    store: &mut ItemStore<C>,
    form: ItemFormInput,
    now: OffsetDateTime,
) -> Result<ItemId> {
    let item = form.into_new_item(now)?;
    store.create(&item)
}

pub fn delete<C: ItemCollection>(
    store: &mut ItemStore<C>,
    id: &ItemId,
    confirm: &mut impl ConfirmPort,
    notify: &mut impl NotifyPort,
) -> Result<DeleteOutcome> {
    store.load()?;
    if store.get(id).is_none() {
        bail!("no saved place with id {id} -- run `mapstash list` to see ids");
    }
    Ok(store.delete(id, confirm, notify)?)
}

pub struct PromptConfirm<R, W> {
    label: String,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    pub fn new(label: impl Into<String>, input: R, output: W) -> Self {
        Self {
            label: label.into(),
            input,
            output,
        }
    }
}

impl<R: BufRead, W: Write> ConfirmPort for PromptConfirm<R, W> {
    fn confirm(&mut self, prompt: &str) -> bool {
        if write!(self.output, "{}: {prompt} [y/N] ", self.label)
            .and_then(|()| self.output.flush())
            .is_err()
        {
            return false;
        }
        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

pub struct AlwaysConfirm;

impl ConfirmPort for AlwaysConfirm {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

pub struct LineNotices<W> {
    output: W,
}

impl<W: Write> LineNotices<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }
}

impl<W: Write> NotifyPort for LineNotices<W> {
    fn notify(&mut self, notice: &Notice) {
        // Failures reach the user through the returned error chain.
        if notice.is_error() {
            return;
        }
        if let Err(error) = writeln!(self.output, "{}", notice.message()) {
            tracing::warn!(%error, "write notice failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AlwaysConfirm, LineNotices, ListRequest, PromptConfirm, add, delete, list};
    use anyhow::Result;
    use mapstash_app::{
        City, DeleteOutcome, ItemFormInput, ItemId, ItemStore, Region, SortMode,
        place_link_with_city,
    };
    use mapstash_testkit::{MemoryCollection, RecordingNotifier, ScriptedConfirm, VenueFaker};
    use std::io::Cursor;
    use time::OffsetDateTime;

    fn seeded_store(count: usize) -> ItemStore<MemoryCollection> {
        let mut faker = VenueFaker::new(21);
        ItemStore::new(MemoryCollection::new(faker.items(count)))
    }

    fn form(name: &str, city: &str) -> ItemFormInput {
        ItemFormInput {
            url: format!("https://example.com/{name}"),
            name: name.to_owned(),
            city: city.to_owned(),
            ..ItemFormInput::default()
        }
    }

    #[test]
    fn list_prints_one_line_per_visible_item() -> Result<()> {
        let mut store = seeded_store(12);
        let view = ListRequest::default().view(SortMode::Newest, Region::All)?;
        let mut out = Vec::new();
        let count = list(&mut store, &view, false, &mut out)?;
        assert_eq!(count, 12);
        let text = String::from_utf8(out)?;
        assert_eq!(text.lines().count(), 12);
        assert!(text.lines().all(|line| line.split('\t').count() == 6));
        assert!(text.contains("https://maps.google.com/?q="));
        Ok(())
    }

    #[test]
    fn list_json_is_an_array_of_items() -> Result<()> {
        let mut store = seeded_store(4);
        let view = ListRequest::default().view(SortMode::Oldest, Region::All)?;
        let mut out = Vec::new();
        list(&mut store, &view, true, &mut out)?;
        let value: serde_json::Value = serde_json::from_slice(&out)?;
        let rows = value.as_array().expect("array");
        assert_eq!(rows.len(), 4);
        assert!(rows[0].get("url").is_some());
        for row in rows {
            let id = row["id"].as_str().expect("id");
            let item = store
                .items()
                .iter()
                .find(|item| item.id.as_str() == id)
                .expect("listed item is in the store");
            let city = item.city.expect("faker sets a city");
            assert_eq!(
                row["city_map_link"].as_str(),
                Some(place_link_with_city(item)?.as_str())
            );
            assert_ne!(row["city_map_link"], row["map_link"]);
            assert!(
                place_link_with_city(item)?
                    .query_pairs()
                    .any(|(key, value)| key == "q" && value.ends_with(city.as_str()))
            );
            assert!(row["address_map_link"].as_str().is_some());
        }
        Ok(())
    }

    #[test]
    fn list_filters_by_region_and_city() -> Result<()> {
        let mut store = ItemStore::new(MemoryCollection::default());
        let now = OffsetDateTime::UNIX_EPOCH;
        add(&mut store, form("north-a", "台北"), now)?;
        add(&mut store, form("north-b", "桃園"), now)?;
        add(&mut store, form("south-a", "高雄"), now)?;

        let request = ListRequest {
            region: Some(Region::North),
            cities: vec![City::Taoyuan],
            ..ListRequest::default()
        };
        let view = request.view(SortMode::Newest, Region::All)?;
        let mut out = Vec::new();
        assert_eq!(list(&mut store, &view, false, &mut out)?, 1);
        assert!(String::from_utf8(out)?.contains("north-b"));
        Ok(())
    }

    #[test]
    fn city_outside_region_is_rejected() {
        let request = ListRequest {
            region: Some(Region::South),
            cities: vec![City::Taipei],
            ..ListRequest::default()
        };
        let error = request
            .view(SortMode::Newest, Region::All)
            .expect_err("Taipei is not southern");
        assert!(error.to_string().contains("--region"));
    }

    #[test]
    fn list_surfaces_load_failure() {
        let mut store = seeded_store(2);
        store.collection_mut().fail_next_load("disk unplugged");
        let view = ListRequest::default()
            .view(SortMode::Newest, Region::All)
            .expect("view");
        let error = list(&mut store, &view, false, &mut Vec::new()).expect_err("load fails");
        assert!(format!("{error:#}").contains("disk unplugged"));
    }

    #[test]
    fn add_rejects_invalid_form_without_touching_collection() {
        let mut store = ItemStore::new(MemoryCollection::default());
        let error = add(&mut store, form("x", "花蓮"), OffsetDateTime::UNIX_EPOCH)
            .expect_err("unknown city");
        assert!(error.to_string().contains("unknown city"));
        assert!(store.collection().calls().is_empty());
    }

    #[test]
    fn delete_unknown_id_fails_before_prompting() {
        let mut store = seeded_store(3);
        let mut confirm = ScriptedConfirm::accepting();
        let mut notices = RecordingNotifier::default();
        let error = delete(&mut store, &ItemId::new("ghost"), &mut confirm, &mut notices)
            .expect_err("ghost id");
        assert!(error.to_string().contains("mapstash list"));
        assert!(confirm.prompts().is_empty());
        assert_eq!(store.collection().delete_calls(), 0);
    }

    #[test]
    fn delete_with_prompt_reads_answer_from_input() -> Result<()> {
        let mut store = seeded_store(3);
        store.load()?;
        let id = store.items()[0].id.clone();

        let mut prompt_out = Vec::new();
        let mut confirm = PromptConfirm::new("target", Cursor::new("n\n"), &mut prompt_out);
        let mut notice_out = Vec::new();
        let outcome = delete(
            &mut store,
            &id,
            &mut confirm,
            &mut LineNotices::new(&mut notice_out),
        )?;
        assert_eq!(outcome, DeleteOutcome::Declined);
        assert!(String::from_utf8(prompt_out)?.contains("[y/N]"));
        assert_eq!(String::from_utf8(notice_out)?, "delete canceled\n");

        let mut notice_out = Vec::new();
        let outcome = delete(
            &mut store,
            &id,
            &mut PromptConfirm::new("target", Cursor::new("YES\n"), Vec::new()),
            &mut LineNotices::new(&mut notice_out),
        )?;
        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert_eq!(store.collection().rows().len(), 2);
        assert_eq!(String::from_utf8(notice_out)?, "place deleted\n");
        Ok(())
    }

    #[test]
    fn failed_delete_is_reported_once_through_the_error() -> Result<()> {
        let mut store = seeded_store(2);
        store.load()?;
        let id = store.items()[1].id.clone();
        store.collection_mut().fail_next_delete("locked");

        let mut notice_out = Vec::new();
        let error = delete(
            &mut store,
            &id,
            &mut AlwaysConfirm,
            &mut LineNotices::new(&mut notice_out),
        )
        .expect_err("delete fails");
        assert!(notice_out.is_empty());
        let rendered = format!("{error:#}");
        assert_eq!(rendered.matches("locked").count(), 1);
        assert!(rendered.contains("try again later"));
        assert_eq!(store.items().len(), 2);
        Ok(())
    }
}
