//! Search filters: host widgets mapped to query parameters

use serde::{Deserialize, Serialize};

/// Display label paired with the value sent to the site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub label: String,
    pub value: String,
}

impl FilterOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Build options from `(label, value)` pairs
pub fn options(pairs: &[(&str, &str)]) -> Vec<FilterOption> {
    pairs
        .iter()
        .map(|(label, value)| FilterOption::new(*label, *value))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriState {
    #[default]
    Ignore,
    Include,
    Exclude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSelection {
    pub index: usize,
    pub ascending: bool,
}

/// A single host filter widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Filter {
    Header {
        name: String,
    },
    Separator,
    Select {
        name: String,
        options: Vec<FilterOption>,
        state: usize,
    },
    Text {
        name: String,
        state: String,
    },
    CheckBox {
        name: String,
        value: String,
        state: bool,
    },
    TriState {
        name: String,
        value: String,
        state: TriState,
    },
    Group {
        name: String,
        filters: Vec<Filter>,
    },
    Sort {
        name: String,
        options: Vec<FilterOption>,
        selection: Option<SortSelection>,
    },
}

impl Filter {
    pub fn header(name: &str) -> Self {
        Filter::Header {
            name: name.to_string(),
        }
    }

    pub fn select(name: &str, options: Vec<FilterOption>) -> Self {
        Filter::Select {
            name: name.to_string(),
            options,
            state: 0,
        }
    }

    pub fn text(name: &str) -> Self {
        Filter::Text {
            name: name.to_string(),
            state: String::new(),
        }
    }

    pub fn checkbox_group(name: &str, options: Vec<FilterOption>) -> Self {
        Filter::Group {
            name: name.to_string(),
            filters: options
                .into_iter()
                .map(|o| Filter::CheckBox {
                    name: o.label,
                    value: o.value,
                    state: false,
                })
                .collect(),
        }
    }

    pub fn sort(name: &str, options: Vec<FilterOption>, default: Option<SortSelection>) -> Self {
        Filter::Sort {
            name: name.to_string(),
            options,
            selection: default,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Filter::Header { name }
            | Filter::Select { name, .. }
            | Filter::Text { name, .. }
            | Filter::CheckBox { name, .. }
            | Filter::TriState { name, .. }
            | Filter::Group { name, .. }
            | Filter::Sort { name, .. } => name,
            Filter::Separator => "",
        }
    }

    /// Apply a textual assignment (CLI `--filter name=value`)
    fn assign(&mut self, value: &str) -> bool {
        match self {
            Filter::Select { options, state, .. } => {
                match position_of(options, value) {
                    Some(i) => {
                        *state = i;
                        true
                    }
                    None => false,
                }
            }
            Filter::Text { state, .. } => {
                *state = value.to_string();
                true
            }
            Filter::CheckBox { state, .. } => {
                *state = matches!(value, "1" | "true" | "yes" | "on");
                true
            }
            Filter::TriState { state, .. } => {
                *state = match value {
                    "include" | "+" | "true" => TriState::Include,
                    "exclude" | "-" | "false" => TriState::Exclude,
                    _ => TriState::Ignore,
                };
                true
            }
            Filter::Group { filters, .. } => {
                let wanted: Vec<String> = value
                    .split(',')
                    .map(|v| v.trim().to_lowercase())
                    .filter(|v| !v.is_empty())
                    .collect();
                for filter in filters.iter_mut() {
                    match filter {
                        Filter::CheckBox { name, value, state } => {
                            *state = wanted.contains(&name.to_lowercase())
                                || wanted.contains(&value.to_lowercase());
                        }
                        Filter::TriState { name, value, state } => {
                            let key_name = name.to_lowercase();
                            let key_value = value.to_lowercase();
                            *state = if wanted.iter().any(|w| *w == key_name || *w == key_value) {
                                TriState::Include
                            } else if wanted
                                .iter()
                                .any(|w| w.strip_prefix('-').is_some_and(|w| w == key_name || w == key_value))
                            {
                                TriState::Exclude
                            } else {
                                TriState::Ignore
                            };
                        }
                        _ => {}
                    }
                }
                true
            }
            Filter::Sort {
                options, selection, ..
            } => {
                let (key, ascending) = match value.rsplit_once(':') {
                    Some((key, dir)) => (key, dir.eq_ignore_ascii_case("asc")),
                    None => (value, false),
                };
                match position_of(options, key) {
                    Some(index) => {
                        *selection = Some(SortSelection { index, ascending });
                        true
                    }
                    None => false,
                }
            }
            Filter::Header { .. } | Filter::Separator => false,
        }
    }
}

fn position_of(options: &[FilterOption], needle: &str) -> Option<usize> {
    options.iter().position(|o| {
        o.value.eq_ignore_ascii_case(needle) || o.label.eq_ignore_ascii_case(needle)
    })
}

/// The filter list a source exposes and receives back on search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterList(pub Vec<Filter>);

impl FilterList {
    pub fn new(filters: Vec<Filter>) -> Self {
        Self(filters)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&Filter> {
        self.0.iter().find(|f| f.name().eq_ignore_ascii_case(name))
    }

    /// Apply `name=value`; returns false when the filter or value is unknown
    pub fn apply_assignment(&mut self, assignment: &str) -> bool {
        let Some((name, value)) = assignment.split_once('=') else {
            return false;
        };
        let (name, value) = (name.trim(), value.trim());
        self.0
            .iter_mut()
            .find(|f| f.name().eq_ignore_ascii_case(name))
            .map(|f| f.assign(value))
            .unwrap_or(false)
    }

    /// Apply several assignments; returns the ones that did not match
    pub fn apply_assignments<'a>(&mut self, assignments: &'a [String]) -> Vec<&'a str> {
        assignments
            .iter()
            .map(String::as_str)
            .filter(|a| !self.apply_assignment(a))
            .collect()
    }

    /// Parameter value of the selected option of a `Select`
    pub fn selected(&self, name: &str) -> Option<&str> {
        match self.find(name)? {
            Filter::Select { options, state, .. } => {
                options.get(*state).map(|o| o.value.as_str())
            }
            _ => None,
        }
    }

    /// Non-empty value of a `Text`
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.find(name)? {
            Filter::Text { state, .. } if !state.trim().is_empty() => Some(state.trim()),
            _ => None,
        }
    }

    /// Values of checked boxes / included tri-states in a `Group`
    pub fn checked(&self, group: &str) -> Vec<&str> {
        self.group_values(group, |f| match f {
            Filter::CheckBox { value, state, .. } if *state => Some(value.as_str()),
            Filter::TriState {
                value,
                state: TriState::Include,
                ..
            } => Some(value.as_str()),
            _ => None,
        })
    }

    /// Values of excluded tri-states in a `Group`
    pub fn excluded(&self, group: &str) -> Vec<&str> {
        self.group_values(group, |f| match f {
            Filter::TriState {
                value,
                state: TriState::Exclude,
                ..
            } => Some(value.as_str()),
            _ => None,
        })
    }

    fn group_values<'a>(&'a self, group: &str, pick: impl Fn(&'a Filter) -> Option<&'a str>) -> Vec<&'a str> {
        match self.find(group) {
            Some(Filter::Group { filters, .. }) => filters.iter().filter_map(pick).collect(),
            _ => Vec::new(),
        }
    }

    /// Selected sort parameter and direction
    pub fn sort(&self, name: &str) -> Option<(&str, bool)> {
        match self.find(name)? {
            Filter::Sort {
                options,
                selection: Some(sel),
                ..
            } => options.get(sel.index).map(|o| (o.value.as_str(), sel.ascending)),
            _ => None,
        }
    }
}

impl From<Vec<Filter>> for FilterList {
    fn from(filters: Vec<Filter>) -> Self {
        Self(filters)
    }
}
