//! The in-memory tag record.
//!
//! `Mp4Tag` is independent of the box tree it was read from: it can be
//! built empty, filled by [`crate::decoder::read_tag`], mutated, and handed
//! to [`crate::rebuild`] any number of times.

use crate::cover::CoverArt;
use serde::Serialize;
use std::fmt;

/// One semantic metadata attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TagField {
    Album,
    AlbumArtist,
    Artist,
    Bpm,
    Comments,
    Composer,
    Copyright,
    CoverArt,
    Encoder,
    Genre,
    Title,
    TrackNumber,
    TrackTotal,
    DiscNumber,
    DiscTotal,
    Year,
}

impl TagField {
    /// Every field, in display order.
    pub const ALL: [TagField; 16] = [
        TagField::Album,
        TagField::AlbumArtist,
        TagField::Artist,
        TagField::Bpm,
        TagField::Comments,
        TagField::Composer,
        TagField::Copyright,
        TagField::CoverArt,
        TagField::Encoder,
        TagField::Genre,
        TagField::Title,
        TagField::TrackNumber,
        TagField::TrackTotal,
        TagField::DiscNumber,
        TagField::DiscTotal,
        TagField::Year,
    ];

    /// snake_case name, as used in JSON output.
    pub fn name(&self) -> &'static str {
        match self {
            TagField::Album => "album",
            TagField::AlbumArtist => "album_artist",
            TagField::Artist => "artist",
            TagField::Bpm => "bpm",
            TagField::Comments => "comments",
            TagField::Composer => "composer",
            TagField::Copyright => "copyright",
            TagField::CoverArt => "cover_art",
            TagField::Encoder => "encoder",
            TagField::Genre => "genre",
            TagField::Title => "title",
            TagField::TrackNumber => "track_number",
            TagField::TrackTotal => "track_total",
            TagField::DiscNumber => "disc_number",
            TagField::DiscTotal => "disc_total",
            TagField::Year => "year",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for TagField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// A field value for generic access through [`Mp4Tag::get`] / [`Mp4Tag::set`].
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Text(String),
    Number(u16),
    Cover(Option<CoverArt>),
}

/// Metadata of one file, one slot per [`TagField`].
///
/// Text fields are empty and numbers are 0 when unset; neither is
/// written back. Values are not validated when set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Mp4Tag {
    #[serde(skip_serializing_if = "String::is_empty")]
    album: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    album_artist: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    artist: String,
    #[serde(skip_serializing_if = "is_zero")]
    bpm: u16,
    #[serde(skip_serializing_if = "String::is_empty")]
    comments: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    composer: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    copyright: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cover_art: Option<CoverArt>,
    #[serde(skip_serializing_if = "String::is_empty")]
    encoder: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    genre: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    title: String,
    #[serde(skip_serializing_if = "is_zero")]
    track_number: u16,
    #[serde(skip_serializing_if = "is_zero")]
    track_total: u16,
    #[serde(skip_serializing_if = "is_zero")]
    disc_number: u16,
    #[serde(skip_serializing_if = "is_zero")]
    disc_total: u16,
    // stored as text, the way the ©day atom holds it
    #[serde(skip_serializing_if = "String::is_empty")]
    year: String,
}

fn is_zero(v: &u16) -> bool { *v == 0 }

impl Mp4Tag {
    pub fn new() -> Self { Self::default() }

    /// Reset every field to its zero value.
    pub fn clear_all(&mut self) {
        *self = Self::default();
    }

    /// True when a rebuild would emit no metadata atoms.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `©alb`
    pub fn album(&self) -> &str { &self.album }
    /// `aART`
    pub fn album_artist(&self) -> &str { &self.album_artist }
    /// `©ART`
    pub fn artist(&self) -> &str { &self.artist }
    /// Beats per minute (`tmpo`), 0 when unset.
    pub fn bpm(&self) -> u16 { self.bpm }
    /// `©cmt`
    pub fn comments(&self) -> &str { &self.comments }
    /// `©wrt`
    pub fn composer(&self) -> &str { &self.composer }
    /// `cprt`
    pub fn copyright(&self) -> &str { &self.copyright }
    /// First image of `covr`, if any.
    pub fn cover_art(&self) -> Option<&CoverArt> { self.cover_art.as_ref() }
    /// `©too`
    pub fn encoder(&self) -> &str { &self.encoder }
    /// Genre name, from `©gen` or a legacy `gnre` code.
    pub fn genre(&self) -> &str { &self.genre }
    /// `©nam`
    pub fn title(&self) -> &str { &self.title }
    /// Current track of `trkn`; [`Mp4Tag::track_total`] shares the atom.
    pub fn track_number(&self) -> u16 { self.track_number }
    pub fn track_total(&self) -> u16 { self.track_total }
    /// Current disc of `disk`; [`Mp4Tag::disc_total`] shares the atom.
    pub fn disc_number(&self) -> u16 { self.disc_number }
    pub fn disc_total(&self) -> u16 { self.disc_total }

    /// Release year; 0 when unset or when the stored text is not a number.
    pub fn year(&self) -> i32 {
        self.year.trim().parse().unwrap_or(0)
    }

    /// The year exactly as stored.
    pub fn year_text(&self) -> &str { &self.year }

    pub fn set_album(&mut self, v: impl Into<String>) { self.album = v.into(); }
    pub fn set_album_artist(&mut self, v: impl Into<String>) { self.album_artist = v.into(); }
    pub fn set_artist(&mut self, v: impl Into<String>) { self.artist = v.into(); }
    pub fn set_bpm(&mut self, v: u16) { self.bpm = v; }
    pub fn set_comments(&mut self, v: impl Into<String>) { self.comments = v.into(); }
    pub fn set_composer(&mut self, v: impl Into<String>) { self.composer = v.into(); }
    pub fn set_copyright(&mut self, v: impl Into<String>) { self.copyright = v.into(); }
    pub fn set_cover_art(&mut self, v: Option<CoverArt>) { self.cover_art = v; }
    pub fn set_encoder(&mut self, v: impl Into<String>) { self.encoder = v.into(); }
    pub fn set_genre(&mut self, v: impl Into<String>) { self.genre = v.into(); }
    pub fn set_title(&mut self, v: impl Into<String>) { self.title = v.into(); }
    pub fn set_track_number(&mut self, v: u16) { self.track_number = v; }
    pub fn set_track_total(&mut self, v: u16) { self.track_total = v; }
    pub fn set_disc_number(&mut self, v: u16) { self.disc_number = v; }
    pub fn set_disc_total(&mut self, v: u16) { self.disc_total = v; }

    /// Set the year; 0 clears it.
    pub fn set_year(&mut self, v: i32) {
        self.year = if v == 0 { String::new() } else { v.to_string() };
    }

    /// Store year text verbatim (e.g. a full `2021-04-01` date).
    pub fn set_year_text(&mut self, v: impl Into<String>) { self.year = v.into(); }

    /// Value of any field, wrapped by kind.
    pub fn get(&self, field: TagField) -> TagValue {
        match field {
            TagField::Bpm => TagValue::Number(self.bpm),
            TagField::TrackNumber => TagValue::Number(self.track_number),
            TagField::TrackTotal => TagValue::Number(self.track_total),
            TagField::DiscNumber => TagValue::Number(self.disc_number),
            TagField::DiscTotal => TagValue::Number(self.disc_total),
            TagField::CoverArt => TagValue::Cover(self.cover_art.clone()),
            text => TagValue::Text(self.text(text).unwrap_or_default().to_string()),
        }
    }

    /// Assign a value; hands the value back when its kind does not fit the field.
    pub fn set(&mut self, field: TagField, value: TagValue) -> Result<(), TagValue> {
        match (field, value) {
            (TagField::CoverArt, TagValue::Cover(c)) => self.cover_art = c,
            (f, TagValue::Number(n)) => match self.number_mut(f) {
                Some(slot) => *slot = n,
                None => return Err(TagValue::Number(n)),
            },
            (f, TagValue::Text(s)) => match self.text_mut(f) {
                Some(slot) => *slot = s,
                None => return Err(TagValue::Text(s)),
            },
            (_, v) => return Err(v),
        }
        Ok(())
    }

    /// Reset one field to its zero value.
    pub fn clear(&mut self, field: TagField) {
        if field == TagField::CoverArt {
            self.cover_art = None;
        } else if let Some(n) = self.number_mut(field) {
            *n = 0;
        } else if let Some(s) = self.text_mut(field) {
            s.clear();
        }
    }

    pub(crate) fn text_mut(&mut self, field: TagField) -> Option<&mut String> {
        let slot = match field {
            TagField::Album => &mut self.album,
            TagField::AlbumArtist => &mut self.album_artist,
            TagField::Artist => &mut self.artist,
            TagField::Comments => &mut self.comments,
            TagField::Composer => &mut self.composer,
            TagField::Copyright => &mut self.copyright,
            TagField::Encoder => &mut self.encoder,
            TagField::Genre => &mut self.genre,
            TagField::Title => &mut self.title,
            TagField::Year => &mut self.year,
            _ => return None,
        };
        Some(slot)
    }

    pub(crate) fn text(&self, field: TagField) -> Option<&str> {
        let s = match field {
            TagField::Album => &self.album,
            TagField::AlbumArtist => &self.album_artist,
            TagField::Artist => &self.artist,
            TagField::Comments => &self.comments,
            TagField::Composer => &self.composer,
            TagField::Copyright => &self.copyright,
            TagField::Encoder => &self.encoder,
            TagField::Genre => &self.genre,
            TagField::Title => &self.title,
            TagField::Year => &self.year,
            _ => return None,
        };
        Some(s)
    }

    pub(crate) fn number_mut(&mut self, field: TagField) -> Option<&mut u16> {
        let slot = match field {
            TagField::Bpm => &mut self.bpm,
            TagField::TrackNumber => &mut self.track_number,
            TagField::TrackTotal => &mut self.track_total,
            TagField::DiscNumber => &mut self.disc_number,
            TagField::DiscTotal => &mut self.disc_total,
            _ => return None,
        };
        Some(slot)
    }

    pub(crate) fn number(&self, field: TagField) -> u16 {
        match field {
            TagField::Bpm => self.bpm,
            TagField::TrackNumber => self.track_number,
            TagField::TrackTotal => self.track_total,
            TagField::DiscNumber => self.disc_number,
            TagField::DiscTotal => self.disc_total,
            _ => 0,
        }
    }
}
