// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use mapstash_app::{
    Category, City, ConfirmPort, FoodKind, Item, ItemCollection, ItemId, NewItem, Notice,
    NotifyPort,
};
use std::collections::VecDeque;
use std::path::PathBuf;
use time::OffsetDateTime;

const NAME_PREFIXES: [&str; 12] = [
    "阿明", "老王", "小林", "春日", "山海", "金色", "巷口", "老街", "好日", "森林", "白鷺", "海風",
];
const FOOD_NOUNS: [&str; 6] = ["麵店", "飯館", "甜品", "火鍋", "小吃", "食堂"];
const DRINK_NOUNS: [&str; 4] = ["茶飲", "果汁", "手搖", "豆漿"];
const CAFE_NOUNS: [&str; 4] = ["咖啡", "珈琲", "Coffee", "Roasters"];
const SIGHT_NOUNS: [&str; 5] = ["老街", "步道", "燈塔", "公園", "藝術村"];
const ROADS: [&str; 10] = [
    "中山路", "中正路", "民生路", "成功路", "忠孝東路", "和平路", "復興路", "建國路", "自由路",
    "博愛路",
];
const NOTES: [&str; 8] = [
    "cash only",
    "closed on Mondays",
    "go before noon",
    "queue on weekends",
    "try the seasonal menu",
    "parking is tight",
    "great at sunset",
    "",
];

const WINDOW_START: i64 = 1_735_689_600;
const WINDOW_SECONDS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

#[derive(Debug, Clone)]
pub struct VenueFaker {
    rng: DeterministicRng,
    counter: u64,
}

impl VenueFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            counter: 0,
        }
    }

    pub fn city(&mut self) -> City {
        City::ALL[self.rng.int_n(City::ALL.len())]
    }

    pub fn category(&mut self) -> Category {
        match self.rng.int_n(4) {
            0 => {
                let kinds = [
                    None,
                    Some(FoodKind::Rice),
                    Some(FoodKind::Noodle),
                    Some(FoodKind::Dessert),
                    Some(FoodKind::Hotpot),
                    Some(FoodKind::Other),
                ];
                let index = self.rng.int_n(kinds.len());
                Category::Food(kinds[index].clone())
            }
            1 => Category::Drinks,
            2 => Category::Cafe,
            _ => Category::Attraction,
        }
    }

    pub fn created_at(&mut self) -> OffsetDateTime {
        let offset = self.rng.next_u64() % WINDOW_SECONDS;
        OffsetDateTime::from_unix_timestamp(WINDOW_START + offset as i64)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }

    pub fn new_item(&mut self) -> NewItem {
        let city = self.city();
        let category = self.category();
        let noun = match category {
            Category::Food(_) => self.pick(&FOOD_NOUNS),
            Category::Drinks => self.pick(&DRINK_NOUNS),
            Category::Cafe => self.pick(&CAFE_NOUNS),
            _ => self.pick(&SIGHT_NOUNS),
        };
        let name = format!("{}{}", self.pick(&NAME_PREFIXES), noun);
        let address = format!(
            "{}市{}{}號",
            city.as_str(),
            self.pick(&ROADS),
            self.rng.int_n(300) + 1
        );
        let note = self.pick(&NOTES);
        self.counter += 1;

        NewItem {
            name: Some(name),
            address: Some(address),
            url: format!("https://www.instagram.com/reel/fake{:04}", self.counter),
            category: Some(category),
            city,
            note: (!note.is_empty()).then(|| note.to_owned()),
            created_at: self.created_at(),
        }
    }

    pub fn item(&mut self) -> Item {
        let new_item = self.new_item();
        let id = ItemId::new(format!("item-{:04}", self.counter));
        new_item.into_item(id)
    }

    pub fn items(&mut self, count: usize) -> Vec<Item> {
        (0..count).map(|_| self.item()).collect()
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionCall {
    LoadAll,
    Delete(ItemId),
    Create(ItemId),
}

#[derive(Debug, Default)]
pub struct MemoryCollection {
    rows: Vec<Item>,
    calls: Vec<CollectionCall>,
    fail_next_load: Option<String>,
    fail_next_delete: Option<String>,
    next_id: u64,
}

impl MemoryCollection {
    pub fn new(rows: Vec<Item>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn rows(&self) -> &[Item] {
        &self.rows
    }

    pub fn calls(&self) -> &[CollectionCall] {
        &self.calls
    }

    pub fn delete_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, CollectionCall::Delete(_)))
            .count()
    }

    pub fn fail_next_load(&mut self, reason: impl Into<String>) {
        self.fail_next_load = Some(reason.into());
    }

    pub fn fail_next_delete(&mut self, reason: impl Into<String>) {
        self.fail_next_delete = Some(reason.into());
    }
}

impl ItemCollection for MemoryCollection {
    fn load_all(&mut self) -> Result<Vec<Item>> {
        self.calls.push(CollectionCall::LoadAll);
        if let Some(reason) = self.fail_next_load.take() {
            bail!("{reason}");
        }
        let mut rows = self.rows.clone();
        rows.sort_by_key(|item| std::cmp::Reverse(item.created_seconds()));
        Ok(rows)
    }

    fn delete_by_id(&mut self, id: &ItemId) -> Result<()> {
        self.calls.push(CollectionCall::Delete(id.clone()));
        if let Some(reason) = self.fail_next_delete.take() {
            bail!("{reason}");
        }
        let before = self.rows.len();
        self.rows.retain(|item| &item.id != id);
        if self.rows.len() == before {
            bail!("item {id} not found");
        }
        Ok(())
    }

    fn create(&mut self, item: &NewItem) -> Result<ItemId> {
        self.next_id += 1;
        let id = ItemId::new(format!("mem-{:04}", self.next_id));
        self.calls.push(CollectionCall::Create(id.clone()));
        self.rows.push(item.clone().into_item(id.clone()));
        Ok(id)
    }
}

#[derive(Debug, Default)]
pub struct ScriptedConfirm {
    answers: VecDeque<bool>,
    prompts: Vec<String>,
}

impl ScriptedConfirm {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            prompts: Vec::new(),
        }
    }

    pub fn accepting() -> Self {
        Self::new([true])
    }

    pub fn declining() -> Self {
        Self::new([false])
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl ConfirmPort for ScriptedConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.push(prompt.to_owned());
        self.answers.pop_front().unwrap_or(false)
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Vec<Notice>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }
}

impl NotifyPort for RecordingNotifier {
    fn notify(&mut self, notice: &Notice) {
        self.notices.push(notice.clone());
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("mapstash.db");
    Ok((dir, db_path))
}
