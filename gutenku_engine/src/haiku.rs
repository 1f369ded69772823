// HaikuAggregate: the finished haiku handed to consumers.
//
// An aggregate is built once per request and never changes afterwards.
// Both construction paths (`create` from validated verses, and
// `from_raw_verses` from plain strings) enforce exactly three verses; the
// raw path also checks the 5-7-5 pattern and the verse content rules.
// "Updates" such as attaching a rendered image or generated metadata return
// a new aggregate and leave the original alone.
//
// `to_dto` flattens the aggregate into a serde-friendly record for API and
// CLI output. Image bytes are not part of the DTO; only the path and a flag.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use gutenku_lang::count_text_syllables;

use crate::chromosome::{Chromosome, HAIKU_PATTERN, validate_pattern};
use crate::error::ValidationError;
use crate::verse::{Verse, VersePools};

type Validated<T> = std::result::Result<T, ValidationError>;

/// Source book of a haiku.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRef {
    pub reference: String,
    pub title: String,
    pub author: String,
}

impl BookRef {
    pub fn new(
        reference: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        BookRef {
            reference: reference.into(),
            title: title.into(),
            author: author.into(),
        }
    }
}

/// Source chapter of a haiku.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRef {
    pub index: usize,
    pub title: Option<String>,
}

impl ChapterRef {
    pub fn new(index: usize, title: Option<String>) -> Self {
        ChapterRef { index, title }
    }
}

/// Inputs to `HaikuAggregate::create`.
#[derive(Debug, Clone)]
pub struct HaikuProps {
    pub book: BookRef,
    pub chapter: ChapterRef,
    pub verses: Vec<Verse>,
    pub raw_verses: Vec<String>,
    pub context: Option<Vec<String>>,
    pub cache_used: bool,
    pub execution_time: Duration,
}

/// Generated metadata attached after the fact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaikuMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub hashtags: Vec<String>,
    pub translations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HaikuAggregate {
    book: BookRef,
    chapter: ChapterRef,
    verses: [Verse; 3],
    raw_verses: Vec<String>,
    context: Option<Vec<String>>,
    image: Option<Vec<u8>>,
    image_path: Option<String>,
    metadata: HaikuMetadata,
    cache_used: bool,
    execution_time: Duration,
}

impl HaikuAggregate {
    /// Build from already-validated verses. Fails unless there are exactly
    /// three.
    pub fn create(props: HaikuProps) -> Validated<Self> {
        let count = props.verses.len();
        let verses: [Verse; 3] = props
            .verses
            .try_into()
            .map_err(|_| ValidationError::InvalidVerseCount(count))?;
        Ok(HaikuAggregate {
            book: props.book,
            chapter: props.chapter,
            verses,
            raw_verses: props.raw_verses,
            context: props.context,
            image: None,
            image_path: None,
            metadata: HaikuMetadata::default(),
            cache_used: props.cache_used,
            execution_time: props.execution_time,
        })
    }

    /// Build from plain strings, validating count, syllable pattern, and
    /// verse content.
    pub fn from_raw_verses(
        book: BookRef,
        chapter: ChapterRef,
        raw: &[&str],
        cache_used: bool,
        execution_time: Duration,
    ) -> Validated<Self> {
        if raw.len() != HAIKU_PATTERN.len() {
            return Err(ValidationError::InvalidVerseCount(raw.len()));
        }
        let counts: Vec<u32> = raw.iter().map(|t| count_text_syllables(t)).collect();
        validate_pattern(&counts)?;
        let verses = raw
            .iter()
            .zip(HAIKU_PATTERN)
            .enumerate()
            .map(|(i, (text, syllables))| Verse::new(text, syllables, i == 0))
            .collect::<Validated<Vec<Verse>>>()?;
        Self::create(HaikuProps {
            book,
            chapter,
            verses,
            raw_verses: raw.iter().map(|t| t.to_string()).collect(),
            context: None,
            cache_used,
            execution_time,
        })
    }

    /// Build from an evolved chromosome. `cache_used` reports whether the
    /// run memoized its evaluations.
    pub fn from_chromosome(
        book: BookRef,
        chapter: ChapterRef,
        chromosome: &Chromosome,
        pools: &VersePools,
        cache_used: bool,
        execution_time: Duration,
    ) -> Validated<Self> {
        let verses = chromosome.verses(pools)?;
        Self::create(HaikuProps {
            book,
            chapter,
            raw_verses: verses.iter().map(|v| v.text().to_string()).collect(),
            verses: verses.into_iter().cloned().collect(),
            context: None,
            cache_used,
            execution_time,
        })
    }

    /// Copy with a rendered image attached.
    pub fn with_image(&self, image: Vec<u8>, image_path: Option<String>) -> Self {
        HaikuAggregate {
            image: Some(image),
            image_path,
            ..self.clone()
        }
    }

    /// Copy with generated metadata attached.
    pub fn with_metadata(&self, metadata: HaikuMetadata) -> Self {
        HaikuAggregate {
            metadata,
            ..self.clone()
        }
    }

    pub fn book(&self) -> &BookRef {
        &self.book
    }

    pub fn chapter(&self) -> &ChapterRef {
        &self.chapter
    }

    pub fn verses(&self) -> &[Verse; 3] {
        &self.verses
    }

    /// Display text of the three verses.
    pub fn verse_texts(&self) -> Vec<String> {
        self.verses
            .iter()
            .map(|v| v.cleaned_text().to_string())
            .collect()
    }

    pub fn raw_verses(&self) -> &[String] {
        &self.raw_verses
    }

    pub fn context(&self) -> Option<&[String]> {
        self.context.as_deref()
    }

    pub fn image(&self) -> Option<&[u8]> {
        self.image.as_deref()
    }

    pub fn image_path(&self) -> Option<&str> {
        self.image_path.as_deref()
    }

    pub fn metadata(&self) -> &HaikuMetadata {
        &self.metadata
    }

    pub fn cache_used(&self) -> bool {
        self.cache_used
    }

    pub fn execution_time(&self) -> Duration {
        self.execution_time
    }

    pub fn to_dto(&self) -> HaikuDto {
        HaikuDto {
            book: self.book.clone(),
            chapter: self.chapter.clone(),
            verses: self.verse_texts(),
            raw_verses: self.raw_verses.clone(),
            context: self.context.clone(),
            has_image: self.image.is_some(),
            image_path: self.image_path.clone(),
            title: self.metadata.title.clone(),
            description: self.metadata.description.clone(),
            hashtags: self.metadata.hashtags.clone(),
            translations: self.metadata.translations.clone(),
            cache_used: self.cache_used,
            execution_time_ms: self.execution_time.as_millis() as u64,
        }
    }
}

/// Serializable view of a `HaikuAggregate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HaikuDto {
    pub book: BookRef,
    pub chapter: ChapterRef,
    pub verses: Vec<String>,
    pub raw_verses: Vec<String>,
    pub context: Option<Vec<String>>,
    pub has_image: bool,
    pub image_path: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub hashtags: Vec<String>,
    pub translations: BTreeMap<String, String>,
    pub cache_used: bool,
    pub execution_time_ms: u64,
}
