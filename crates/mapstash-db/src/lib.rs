// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use mapstash_app::{Category, City, Item, ItemCollection, ItemId, NewItem};
use rusqlite::{Connection, params};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const APP_NAME: &str = "mapstash";
pub const DB_PATH_ENV: &str = "MAPSTASH_DB_PATH";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[(
    "items",
    &[
        "id",
        "name",
        "address",
        "url",
        "category",
        "sub_category",
        "city",
        "note",
        "created_at",
    ],
)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[RequiredIndex {
    name: "idx_items_created_at",
    create_sql: "CREATE INDEX IF NOT EXISTS idx_items_created_at ON items (created_at);",
}];

struct DemoPlace {
    name: &'static str,
    address: &'static str,
    url: &'static str,
    category: &'static str,
    sub_category: &'static str,
    city: City,
    note: &'static str,
    created_at: i64,
}

const DEMO_PLACES: [DemoPlace; 8] = [
    DemoPlace {
        name: "永和豆漿大王",
        address: "台北市大安區復興南路一段102號",
        url: "https://www.instagram.com/reel/demo-soymilk",
        category: "food",
        sub_category: "rice",
        city: City::Taipei,
        note: "open late",
        created_at: 1_759_000_000,
    },
    DemoPlace {
        name: "九份老街",
        address: "新北市瑞芳區基山街",
        url: "https://www.instagram.com/reel/demo-jiufen",
        category: "attraction",
        sub_category: "",
        city: City::NewTaipei,
        note: "",
        created_at: 1_759_100_000,
    },
    DemoPlace {
        name: "大溪老茶廠",
        address: "桃園市大溪區復興路二段732巷80號",
        url: "https://www.instagram.com/reel/demo-teafactory",
        category: "cafe",
        sub_category: "",
        city: City::Taoyuan,
        note: "weekday mornings are quiet",
        created_at: 1_759_200_000,
    },
    DemoPlace {
        name: "春水堂",
        address: "台中市西區四維街30號",
        url: "https://www.instagram.com/reel/demo-bubbletea",
        category: "drinks",
        sub_category: "",
        city: City::Taichung,
        note: "",
        created_at: 1_759_300_000,
    },
    DemoPlace {
        name: "阿章肉圓",
        address: "彰化縣彰化市長安街144號",
        url: "https://www.instagram.com/reel/demo-bawan",
        category: "food",
        sub_category: "other",
        city: City::Changhua,
        note: "",
        created_at: 1_759_400_000,
    },
    DemoPlace {
        name: "度小月擔仔麵",
        address: "台南市中西區中正路16號",
        url: "https://www.instagram.com/reel/demo-danzai",
        category: "food",
        sub_category: "noodle",
        city: City::Tainan,
        note: "try the shrimp rolls too",
        created_at: 1_759_500_000,
    },
    DemoPlace {
        name: "冰雪甜品",
        address: "台南市東區大學路西段",
        url: "https://www.instagram.com/reel/demo-shavedice",
        category: "food",
        sub_category: "dessert",
        city: City::Tainan,
        note: "",
        created_at: 1_759_600_000,
    },
    DemoPlace {
        name: "駁二藝術特區",
        address: "高雄市鹽埕區大勇路1號",
        url: "https://www.instagram.com/reel/demo-pier2",
        category: "attraction",
        sub_category: "",
        city: City::Kaohsiung,
        note: "sunset by the harbor",
        created_at: 1_759_700_000,
    },
];

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
        }

        ensure_required_indexes(&self.conn)
    }

    pub fn seed_demo_data(&self) -> Result<usize> {
        if self.count_items()? > 0 {
            debug!("items table not empty; skipping demo seed");
            return Ok(0);
        }

        for place in &DEMO_PLACES {
            let created_at = OffsetDateTime::from_unix_timestamp(place.created_at)
                .with_context(|| format!("demo timestamp for {}", place.name))?;
            self.create_item(&NewItem {
                name: Some(place.name.to_owned()),
                address: Some(place.address.to_owned()),
                url: place.url.to_owned(),
                category: Category::from_codes(place.category, place.sub_category),
                city: place.city,
                note: (!place.note.is_empty()).then(|| place.note.to_owned()),
                created_at,
            })
            .with_context(|| format!("insert demo place {}", place.name))?;
        }
        info!(count = DEMO_PLACES.len(), "seeded demo places");
        Ok(DEMO_PLACES.len())
    }

    pub fn count_items(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
            .context("count items")?;
        usize::try_from(count).context("item count out of range")
    }

    // Newest first; undated rows last, ties broken by insertion order newest-first.
    pub fn list_items(&self) -> Result<Vec<Item>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT
                  id, name, address, url, category, sub_category,
                  city, note, created_at
                FROM items
                ORDER BY created_at IS NULL, created_at DESC, rowid DESC
                ",
            )
            .context("prepare items query")?;
        let rows = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let category_raw: Option<String> = row.get(4)?;
                let sub_category_raw: Option<String> = row.get(5)?;
                let city_raw: Option<String> = row.get(6)?;
                let created_at_raw: Option<String> = row.get(8)?;

                let city_raw = city_raw.unwrap_or_default();
                let city = City::parse(&city_raw);
                if city.is_none() && !city_raw.trim().is_empty() {
                    debug!(%id, city = %city_raw, "unknown city; treating as absent");
                }

                let created_at = match created_at_raw.as_deref().map(parse_datetime) {
                    Some(Ok(value)) => Some(value),
                    Some(Err(error)) => {
                        warn!(%id, error = %error, "unreadable created_at; treating as absent");
                        None
                    }
                    None => None,
                };

                Ok(Item {
                    category: Category::from_codes(
                        category_raw.as_deref().unwrap_or_default(),
                        sub_category_raw.as_deref().unwrap_or_default(),
                    ),
                    id: ItemId::new(id),
                    name: non_blank(row.get(1)?),
                    address: non_blank(row.get(2)?),
                    url: row.get(3)?,
                    city,
                    note: non_blank(row.get(7)?),
                    created_at,
                })
            })
            .context("query items")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect items")
    }

    pub fn create_item(&self, item: &NewItem) -> Result<ItemId> {
        let id = ItemId::new(Uuid::new_v4().to_string());
        let created_at = format_datetime(item.created_at)?;
        self.conn
            .execute(
                "
                INSERT INTO items (
                  id, name, address, url, category, sub_category,
                  city, note, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    id.as_str(),
                    item.name,
                    item.address,
                    item.url,
                    item.category.as_ref().map_or("", Category::code),
                    item.category
                        .as_ref()
                        .and_then(Category::sub_code)
                        .unwrap_or_default(),
                    item.city.as_str(),
                    item.note,
                    created_at,
                ],
            )
            .context("insert item")?;
        Ok(id)
    }

    pub fn delete_item(&self, id: &ItemId) -> Result<()> {
        let removed = self
            .conn
            .execute("DELETE FROM items WHERE id = ?", params![id.as_str()])
            .with_context(|| format!("delete item {id}"))?;
        if removed == 0 {
            bail!("item {id} not found -- reload the list and retry");
        }
        Ok(())
    }
}

impl ItemCollection for Store {
    fn load_all(&mut self) -> Result<Vec<Item>> {
        self.list_items()
    }

    fn delete_by_id(&mut self, id: &ItemId) -> Result<()> {
        self.delete_item(id)
    }

    fn create(&mut self, item: &NewItem) -> Result<ItemId> {
        self.create_item(item)
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os(DB_PATH_ENV) {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set {DB_PATH_ENV} to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("mapstash.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; point [storage].db_path at a mapstash database"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; migrate the database before launching",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }

    let existing_indexes = index_names(conn)?;
    let missing = REQUIRED_INDEXES
        .iter()
        .filter(|index| !existing_indexes.contains(index.name))
        .map(|index| index.name)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!(
            "database is missing required indexes: {}; migrate the database before launching",
            missing.join(", ")
        );
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))
}

fn index_names(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT name
            FROM sqlite_master
            WHERE type = 'index'
              AND name NOT LIKE 'sqlite_%'
            ORDER BY name ASC
            ",
        )
        .context("prepare index names query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query index names")?;
    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("collect index names")
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

// Second precision in UTC so text order matches time order.
fn format_datetime(value: OffsetDateTime) -> Result<String> {
    value
        .to_offset(UtcOffset::UTC)
        .replace_nanosecond(0)
        .context("truncate timestamp to seconds")?
        .format(&Rfc3339)
        .context("format timestamp")
}

fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(value);
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    bail!("unsupported datetime format {raw:?}")
}
