//! Movie catalogue model used by the command line loader.

use chrono::{DateTime, Utc};
use cosmap_core::{DocValue, Entity, FieldDef, FieldKind};
use serde::{Deserialize, Serialize};

/// One catalogue record. `tmdb_id` is the id and `title` the partition key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub tmdb_id: i64,
    pub title: String,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub budget: f64,
    #[serde(default)]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Local bookkeeping, never written to the store.
    #[serde(default)]
    pub source_row: usize,
}

impl Entity for Movie {
    fn type_name() -> &'static str {
        "MovieFull"
    }

    fn fields() -> Vec<FieldDef<Self>> {
        vec![
            FieldDef::<Self>::settable(
                "TmdbId",
                FieldKind::Int,
                |m| DocValue::from(m.tmdb_id),
                |m, v| {
                    m.tmdb_id = serde_json::from_value(v)?;
                    Ok(())
                },
            )
            .id(),
            FieldDef::<Self>::settable(
                "Title",
                FieldKind::Text,
                |m| DocValue::from(&m.title),
                |m, v| {
                    m.title = serde_json::from_value(v)?;
                    Ok(())
                },
            )
            .partition_key(),
            FieldDef::<Self>::settable(
                "Tagline",
                FieldKind::Text,
                |m| DocValue::from(m.tagline.clone()),
                |m, v| {
                    m.tagline = serde_json::from_value(v)?;
                    Ok(())
                },
            ),
            FieldDef::<Self>::settable(
                "Overview",
                FieldKind::Text,
                |m| DocValue::from(m.overview.clone()),
                |m, v| {
                    m.overview = serde_json::from_value(v)?;
                    Ok(())
                },
            ),
            FieldDef::<Self>::settable(
                "Budget",
                FieldKind::Float,
                |m| DocValue::from(m.budget),
                |m, v| {
                    m.budget = serde_json::from_value(v)?;
                    Ok(())
                },
            ),
            FieldDef::<Self>::settable(
                "ReleaseDate",
                FieldKind::DateTime,
                |m| DocValue::from(m.release_date),
                |m, v| {
                    m.release_date = serde_json::from_value(v)?;
                    Ok(())
                },
            ),
            FieldDef::<Self>::settable(
                "Genres",
                FieldKind::Complex,
                |m| DocValue::nested(&m.genres),
                |m, v| {
                    m.genres = serde_json::from_value(v)?;
                    Ok(())
                },
            ),
            FieldDef::<Self>::new("SourceRow", FieldKind::Int, |m| DocValue::from(m.source_row as i64)).ignored(),
        ]
    }
}
