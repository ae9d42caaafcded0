//! Search filters and their translation into GraphQL variables

use crate::model::filter::options;
use crate::model::{Filter, FilterList, SortSelection};
use serde_json::{json, Map, Value};

pub const SORT: &str = "Sort";
pub const GENRES: &str = "Genres";
pub const FORMAT: &str = "Format";
pub const STATUS: &str = "Status";
pub const SEASON: &str = "Season";
pub const YEAR: &str = "Year";

const GENRE_NAMES: &[&str] = &[
    "Action", "Adventure", "Comedy", "Drama", "Ecchi", "Fantasy", "Horror", "Mahou Shoujo", "Mecha",
    "Music", "Mystery", "Psychological", "Romance", "Sci-Fi", "Slice of Life", "Sports",
    "Supernatural", "Thriller",
];

pub fn filter_list() -> FilterList {
    let genres: Vec<(&str, &str)> = GENRE_NAMES.iter().map(|g| (*g, *g)).collect();
    FilterList::new(vec![
        Filter::header("Filters are combined with the text query"),
        Filter::sort(
            SORT,
            options(&[
                ("Popularity", "POPULARITY"),
                ("Average score", "SCORE"),
                ("Trending", "TRENDING"),
                ("Favourites", "FAVOURITES"),
                ("Title", "TITLE_ROMAJI"),
                ("Date added", "ID"),
                ("Release date", "START_DATE"),
            ]),
            Some(SortSelection {
                index: 0,
                ascending: false,
            }),
        ),
        Filter::checkbox_group(GENRES, options(&genres)),
        Filter::select(
            FORMAT,
            options(&[
                ("Any", ""),
                ("TV", "TV"),
                ("TV Short", "TV_SHORT"),
                ("Movie", "MOVIE"),
                ("Special", "SPECIAL"),
                ("OVA", "OVA"),
                ("ONA", "ONA"),
                ("Music", "MUSIC"),
            ]),
        ),
        Filter::select(
            STATUS,
            options(&[
                ("Any", ""),
                ("Releasing", "RELEASING"),
                ("Finished", "FINISHED"),
                ("Not yet released", "NOT_YET_RELEASED"),
                ("Hiatus", "HIATUS"),
                ("Cancelled", "CANCELLED"),
            ]),
        ),
        Filter::select(
            SEASON,
            options(&[
                ("Any", ""),
                ("Winter", "WINTER"),
                ("Spring", "SPRING"),
                ("Summer", "SUMMER"),
                ("Fall", "FALL"),
            ]),
        ),
        Filter::text(YEAR),
    ])
}

/// Base variables shared by every listing
pub fn page_variables(page: u32, per_page: u32, sort: &[&str]) -> Map<String, Value> {
    let mut vars = Map::new();
    vars.insert("page".into(), json!(page.max(1)));
    vars.insert("perPage".into(), json!(per_page));
    vars.insert("sort".into(), json!(sort));
    vars
}

/// Variables for a search; an empty query leaves `search` out entirely
pub fn search_variables(page: u32, per_page: u32, query: &str, filters: &FilterList) -> Map<String, Value> {
    let order = match filters.sort(SORT) {
        Some((key, true)) => key.to_string(),
        Some((key, false)) => format!("{key}_DESC"),
        None => "POPULARITY_DESC".to_string(),
    };
    // Relevance first for text matches
    let mut sort = Vec::new();
    if !query.trim().is_empty() {
        sort.push("SEARCH_MATCH");
    }
    sort.push(order.as_str());
    let mut vars = page_variables(page, per_page, &sort);

    if !query.trim().is_empty() {
        vars.insert("search".into(), json!(query.trim()));
    }
    let genres = filters.checked(GENRES);
    if !genres.is_empty() {
        vars.insert("genre_in".into(), json!(genres));
    }
    if let Some(format) = filters.selected(FORMAT).filter(|f| !f.is_empty()) {
        vars.insert("format_in".into(), json!([format]));
    }
    if let Some(status) = filters.selected(STATUS).filter(|s| !s.is_empty()) {
        vars.insert("status".into(), json!(status));
    }
    if let Some(season) = filters.selected(SEASON).filter(|s| !s.is_empty()) {
        vars.insert("season".into(), json!(season));
    }
    if let Some(year) = filters.text(YEAR).and_then(|y| y.parse::<i32>().ok()) {
        vars.insert("seasonYear".into(), json!(year));
    }
    vars
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_omits_search() {
        let vars = search_variables(2, 20, "  ", &filter_list());
        assert!(!vars.contains_key("search"));
        assert_eq!(vars["page"], 2);
        assert_eq!(vars["sort"], json!(["POPULARITY_DESC"]));
        assert!(!vars.contains_key("genre_in"));
        assert!(!vars.contains_key("status"));
    }

    #[test]
    fn test_filters_translate() {
        let mut filters = filter_list();
        for assignment in ["Genres=Action,Slice of Life", "Format=Movie", "Status=RELEASING", "Season=fall", "Year=2023", "Sort=Title:asc"] {
            assert!(filters.apply_assignment(assignment), "{assignment}");
        }
        let vars = search_variables(1, 20, "frieren", &filters);
        assert_eq!(vars["search"], "frieren");
        assert_eq!(vars["sort"], json!(["SEARCH_MATCH", "TITLE_ROMAJI"]));
        assert_eq!(vars["genre_in"], json!(["Action", "Slice of Life"]));
        assert_eq!(vars["format_in"], json!(["MOVIE"]));
        assert_eq!(vars["status"], "RELEASING");
        assert_eq!(vars["season"], "FALL");
        assert_eq!(vars["seasonYear"], 2023);
    }

    #[test]
    fn test_bad_year_ignored() {
        let mut filters = filter_list();
        filters.apply_assignment("Year=soon");
        assert!(!search_variables(1, 20, "", &filters).contains_key("seasonYear"));
    }
}
