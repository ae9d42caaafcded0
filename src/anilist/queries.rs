//! GraphQL documents sent to AniList

const MEDIA_FIELDS: &str = r#"
    id
    idMal
    title { romaji english native }
    coverImage { extraLarge large medium }
    description
    genres
    studios { edges { isMain node { name } } }
    status
    season
    seasonYear
    format
    episodes
    nextAiringEpisode { episode airingAt }
"#;

pub const SEARCH_QUERY_HEAD: &str = r#"
query (
    $page: Int, $perPage: Int, $search: String, $sort: [MediaSort],
    $genre_in: [String], $format_in: [MediaFormat], $status: MediaStatus,
    $seasonYear: Int, $season: MediaSeason
) {
  Page(page: $page, perPage: $perPage) {
    pageInfo { hasNextPage currentPage }
    media(
        type: ANIME, isAdult: false, search: $search, sort: $sort,
        genre_in: $genre_in, format_in: $format_in, status: $status,
        seasonYear: $seasonYear, season: $season
    ) {"#;

pub const DETAILS_QUERY_HEAD: &str = r#"
query ($id: Int) {
  Media(id: $id, type: ANIME) {"#;

/// Paged media listing
pub fn search_query() -> String {
    format!("{SEARCH_QUERY_HEAD}{MEDIA_FIELDS}    }}\n  }}\n}}\n")
}

/// Single media by AniList id
pub fn details_query() -> String {
    format!("{DETAILS_QUERY_HEAD}{MEDIA_FIELDS}  }}\n}}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balanced(doc: &str) -> bool {
        doc.matches('{').count() == doc.matches('}').count()
            && doc.matches('(').count() == doc.matches(')').count()
    }

    #[test]
    fn test_documents_are_balanced() {
        assert!(balanced(&search_query()));
        assert!(balanced(&details_query()));
    }

    #[test]
    fn test_search_declares_all_variables() {
        let doc = search_query();
        for var in ["$page", "$perPage", "$search", "$sort", "$genre_in", "$format_in", "$status", "$seasonYear", "$season"] {
            assert!(doc.matches(var).count() >= 2, "{var} declared and used");
        }
        assert!(doc.contains("pageInfo { hasNextPage currentPage }"));
    }
}
