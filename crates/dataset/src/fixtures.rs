//! Sample Track Data
//!
//! Five raw tracks in the public dataset layout, with `id1` duplicated.
//! Used by tests across the workspace and by the inference defaults.

use crate::record::Record;
use crate::schema::{ColumnKind, Schema};
use crate::table::Dataset;
use crate::value::Value;

/// Schema of [`sample_raw_tracks`]
pub fn sample_schema() -> Schema {
    Schema::from_pairs(&[
        ("track_id", ColumnKind::Identifier),
        ("artists", ColumnKind::Identifier),
        ("album_name", ColumnKind::Identifier),
        ("track_name", ColumnKind::Identifier),
        ("track_genre", ColumnKind::Categorical),
        ("popularity", ColumnKind::Numeric),
        ("explicit", ColumnKind::Boolean),
        ("duration_ms", ColumnKind::Numeric),
        ("time_signature", ColumnKind::Numeric),
        ("key", ColumnKind::Numeric),
        ("mode", ColumnKind::Numeric),
        ("danceability", ColumnKind::Numeric),
        ("energy", ColumnKind::Numeric),
        ("loudness", ColumnKind::Numeric),
        ("speechiness", ColumnKind::Numeric),
        ("acousticness", ColumnKind::Numeric),
        ("instrumentalness", ColumnKind::Numeric),
        ("liveness", ColumnKind::Numeric),
        ("valence", ColumnKind::Numeric),
        ("tempo", ColumnKind::Numeric),
    ])
}

#[allow(clippy::too_many_arguments)]
fn row(
    id: &str,
    artists: &str,
    album: &str,
    name: &str,
    genre: &str,
    popularity: i64,
    explicit: bool,
    ints: [i64; 4],
    audio: [f64; 9],
) -> Vec<Value> {
    let mut values = vec![
        id.into(),
        artists.into(),
        album.into(),
        name.into(),
        genre.into(),
        popularity.into(),
        explicit.into(),
    ];
    values.extend(ints.iter().map(|&v| Value::Int(v)));
    values.extend(audio.iter().map(|&v| Value::Float(v)));
    values
}

/// Five raw rows; rows 0 and 3 share identifier `id1`
pub fn sample_raw_tracks() -> Dataset {
    let rows = vec![
        row(
            "id1", "Artist A", "Album 1", "Hit Song", "pop", 80, false,
            [210000, 4, 0, 1],
            [0.8, 0.9, -5.0, 0.05, 0.1, 0.0, 0.2, 0.9, 120.0],
        ),
        row(
            "id2", "Artist B;Artist C", "Album 2", "Rock Anthem", "rock", 60, true,
            [180000, 4, 2, 0],
            [0.5, 0.8, -4.5, 0.04, 0.01, 0.002, 0.1, 0.4, 140.0],
        ),
        row(
            "id3", "Artist D", "Album 3", "Jazz Tune", "jazz", 20, false,
            [240000, 3, 5, 1],
            [0.4, 0.4, -12.0, 0.05, 0.8, 0.7, 0.15, 0.3, 90.0],
        ),
        row(
            "id1", "Artist A", "Album 1", "Hit Song", "pop", 80, false,
            [210000, 4, 0, 1],
            [0.8, 0.9, -5.0, 0.05, 0.1, 0.0, 0.2, 0.9, 120.0],
        ),
        row(
            "id4", "Artist E", "Album 4", "Symphony No. 5", "classical", 40, false,
            [300000, 5, 9, 1],
            [0.1, 0.2, -20.0, 0.03, 0.95, 0.9, 0.1, 0.1, 70.0],
        ),
    ];
    let schema = sample_schema();
    let records: Vec<Record> = rows
        .into_iter()
        .map(|values| schema.names().zip(values).collect())
        .collect();
    Dataset::from_records(schema, &records)
}

/// A new, unseen track with every modeled attribute set
pub fn sample_track() -> Record {
    Record::new()
        .with("track_id", "new_song_001")
        .with("artists", "Unknown Artist")
        .with("album_name", "New Album")
        .with("track_name", "Demo Track")
        .with("explicit", false)
        .with("danceability", 0.70)
        .with("energy", 0.80)
        .with("key", 5i64)
        .with("loudness", -5.5)
        .with("mode", 1i64)
        .with("speechiness", 0.04)
        .with("acousticness", 0.10)
        .with("instrumentalness", 0.00)
        .with("liveness", 0.15)
        .with("valence", 0.65)
        .with("tempo", 120.0)
        .with("duration_ms", 210000i64)
        .with("time_signature", 4i64)
        .with("track_genre", "pop")
}
