// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::catalog::cities_of;
use crate::ids::ItemId;
use crate::model::{City, Region, SortMode};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListViewState {
    pub search_text: String,
    pub sort_mode: SortMode,
    pub region: Region,
    pub selected_cities: BTreeSet<City>,
    pub expanded_id: Option<ItemId>,
    pub loading: bool,
    pub load_error: Option<String>,
    pub status_line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListCommand {
    SetSearch(String),
    PushSearchChar(char),
    PopSearchChar,
    ClearSearch,
    SetSort(SortMode),
    CycleSort,
    SelectRegion(Region),
    CycleRegion,
    ToggleCity(City),
    ToggleExpanded(ItemId),
    ItemRemoved(ItemId),
    LoadStarted,
    LoadSucceeded,
    LoadFailed(String),
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    SearchChanged(String),
    SortChanged(SortMode),
    RegionChanged(Region),
    CitiesChanged(BTreeSet<City>),
    CityUnavailable(City),
    ExpandedChanged(Option<ItemId>),
    LoadingChanged(bool),
    LoadErrorChanged(Option<String>),
    StatusUpdated(String),
    StatusCleared,
}

impl ListViewState {
    pub fn with_defaults(sort_mode: SortMode, region: Region) -> Self {
        Self {
            sort_mode,
            region,
            ..Self::default()
        }
    }

    pub fn dispatch(&mut self, command: ListCommand) -> Vec<ListEvent> {
        match command {
            ListCommand::SetSearch(text) => {
                self.search_text = text;
                vec![ListEvent::SearchChanged(self.search_text.clone())]
            }
            ListCommand::PushSearchChar(ch) => {
                self.search_text.push(ch);
                vec![ListEvent::SearchChanged(self.search_text.clone())]
            }
            ListCommand::PopSearchChar => {
                self.search_text.pop();
                vec![ListEvent::SearchChanged(self.search_text.clone())]
            }
            ListCommand::ClearSearch => {
                self.search_text.clear();
                vec![ListEvent::SearchChanged(String::new())]
            }
            ListCommand::SetSort(mode) => {
                self.sort_mode = mode;
                vec![ListEvent::SortChanged(mode)]
            }
            ListCommand::CycleSort => {
                self.sort_mode = self.sort_mode.next();
                vec![
                    ListEvent::SortChanged(self.sort_mode),
                    self.set_status(format!("sort {}", self.sort_mode.label())),
                ]
            }
            ListCommand::SelectRegion(region) => self.select_region(region),
            ListCommand::CycleRegion => self.select_region(self.region.next()),
            ListCommand::ToggleCity(city) => self.toggle_city(city),
            ListCommand::ToggleExpanded(id) => {
                if self.expanded_id.as_ref() == Some(&id) {
                    self.expanded_id = None;
                } else {
                    self.expanded_id = Some(id);
                }
                vec![ListEvent::ExpandedChanged(self.expanded_id.clone())]
            }
            ListCommand::ItemRemoved(id) => {
                if self.expanded_id.as_ref() != Some(&id) {
                    return Vec::new();
                }
                self.expanded_id = None;
                vec![ListEvent::ExpandedChanged(None)]
            }
            ListCommand::LoadStarted => {
                self.loading = true;
                vec![ListEvent::LoadingChanged(true)]
            }
            ListCommand::LoadSucceeded => {
                self.loading = false;
                let mut events = vec![ListEvent::LoadingChanged(false)];
                if self.load_error.take().is_some() {
                    events.push(ListEvent::LoadErrorChanged(None));
                }
                events
            }
            ListCommand::LoadFailed(message) => {
                self.loading = false;
                self.load_error = Some(message);
                vec![
                    ListEvent::LoadingChanged(false),
                    ListEvent::LoadErrorChanged(self.load_error.clone()),
                ]
            }
            ListCommand::SetStatus(message) => vec![self.set_status(message)],
            ListCommand::ClearStatus => {
                self.status_line = None;
                vec![ListEvent::StatusCleared]
            }
        }
    }

    pub fn selectable_cities(&self) -> &'static [City] {
        cities_of(self.region)
    }

    fn select_region(&mut self, region: Region) -> Vec<ListEvent> {
        // Any region pick, including the current one, clears the city chips.
        self.region = region;
        self.selected_cities.clear();
        vec![
            ListEvent::RegionChanged(region),
            ListEvent::CitiesChanged(BTreeSet::new()),
        ]
    }

    fn toggle_city(&mut self, city: City) -> Vec<ListEvent> {
        if !self.selectable_cities().contains(&city) {
            return vec![
                ListEvent::CityUnavailable(city),
                self.set_status(format!(
                    "{} is not in {} -- pick a matching region first",
                    city.as_str(),
                    self.region.label()
                )),
            ];
        }

        if !self.selected_cities.remove(&city) {
            self.selected_cities.insert(city);
        }
        vec![ListEvent::CitiesChanged(self.selected_cities.clone())]
    }

    fn set_status(&mut self, message: impl Into<String>) -> ListEvent {
        let message = message.into();
        self.status_line = Some(message.clone());
        ListEvent::StatusUpdated(message)
    }
}

#[cfg(test)]
mod tests {
    use super::{ListCommand, ListEvent, ListViewState};
    use crate::ItemId;
    use crate::model::{City, Region, SortMode};
    use std::collections::BTreeSet;

    #[test]
    fn selecting_region_resets_cities_even_when_unchanged() {
        let mut state = ListViewState::default();
        state.dispatch(ListCommand::SelectRegion(Region::South));
        state.dispatch(ListCommand::ToggleCity(City::Tainan));
        assert_eq!(state.selected_cities, BTreeSet::from([City::Tainan]));

        let events = state.dispatch(ListCommand::SelectRegion(Region::South));
        assert!(state.selected_cities.is_empty());
        assert_eq!(
            events,
            vec![
                ListEvent::RegionChanged(Region::South),
                ListEvent::CitiesChanged(BTreeSet::new()),
            ]
        );
    }

    #[test]
    fn toggling_a_city_twice_restores_selection() {
        let mut state = ListViewState::default();
        state.dispatch(ListCommand::SelectRegion(Region::North));
        state.dispatch(ListCommand::ToggleCity(City::Taipei));
        let before = state.selected_cities.clone();

        state.dispatch(ListCommand::ToggleCity(City::Taoyuan));
        state.dispatch(ListCommand::ToggleCity(City::Taoyuan));
        assert_eq!(state.selected_cities, before);
    }

    #[test]
    fn city_outside_region_is_rejected() {
        let mut state = ListViewState::default();
        let events = state.dispatch(ListCommand::ToggleCity(City::Taipei));
        assert!(state.selected_cities.is_empty());
        assert_eq!(events[0], ListEvent::CityUnavailable(City::Taipei));

        state.dispatch(ListCommand::SelectRegion(Region::Central));
        state.dispatch(ListCommand::ToggleCity(City::Kaohsiung));
        assert!(state.selected_cities.is_empty());
        assert!(
            state
                .status_line
                .as_deref()
                .is_some_and(|line| line.contains("高雄"))
        );
    }

    #[test]
    fn expansion_is_single_selection() {
        let mut state = ListViewState::default();
        state.dispatch(ListCommand::ToggleExpanded(ItemId::new("a")));
        assert_eq!(state.expanded_id, Some(ItemId::new("a")));

        state.dispatch(ListCommand::ToggleExpanded(ItemId::new("b")));
        assert_eq!(state.expanded_id, Some(ItemId::new("b")));

        let events = state.dispatch(ListCommand::ToggleExpanded(ItemId::new("b")));
        assert_eq!(state.expanded_id, None);
        assert_eq!(events, vec![ListEvent::ExpandedChanged(None)]);
    }

    #[test]
    fn removing_expanded_item_collapses_it() {
        let mut state = ListViewState::default();
        state.dispatch(ListCommand::ToggleExpanded(ItemId::new("a")));

        assert!(state.dispatch(ListCommand::ItemRemoved(ItemId::new("z"))).is_empty());
        assert_eq!(state.expanded_id, Some(ItemId::new("a")));

        state.dispatch(ListCommand::ItemRemoved(ItemId::new("a")));
        assert_eq!(state.expanded_id, None);
    }

    #[test]
    fn load_error_persists_until_next_success() {
        let mut state = ListViewState::default();
        state.dispatch(ListCommand::LoadStarted);
        assert!(state.loading);

        state.dispatch(ListCommand::LoadFailed("offline".to_owned()));
        assert!(!state.loading);
        assert_eq!(state.load_error.as_deref(), Some("offline"));

        state.dispatch(ListCommand::ClearStatus);
        assert_eq!(state.load_error.as_deref(), Some("offline"));

        let events = state.dispatch(ListCommand::LoadSucceeded);
        assert_eq!(state.load_error, None);
        assert!(events.contains(&ListEvent::LoadErrorChanged(None)));
    }

    #[test]
    fn search_editing_commands() {
        let mut state = ListViewState::default();
        state.dispatch(ListCommand::PushSearchChar('麵'));
        state.dispatch(ListCommand::PushSearchChar('x'));
        state.dispatch(ListCommand::PopSearchChar);
        assert_eq!(state.search_text, "麵");

        state.dispatch(ListCommand::ClearSearch);
        assert!(state.search_text.is_empty());
    }

    #[test]
    fn sort_cycle_updates_status() {
        let mut state = ListViewState::with_defaults(SortMode::Oldest, Region::All);
        let events = state.dispatch(ListCommand::CycleSort);
        assert_eq!(state.sort_mode, SortMode::NorthToSouth);
        assert_eq!(
            events,
            vec![
                ListEvent::SortChanged(SortMode::NorthToSouth),
                ListEvent::StatusUpdated("sort north to south".to_owned()),
            ]
        );
    }
}
