//! Closed category enumerations used by identifiers and metadata
//!
//! Every category carries a single-letter (or language) code, an English
//! category name and its Vietnamese label. Metadata rows repeat the category
//! and label next to the code, and validation cross-checks the three.

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of a category table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryEntry {
    pub code: &'static str,
    pub category: &'static str,
    pub vietnamese: &'static str,
    /// Reserved entries exist in the table but may not be used in identifiers
    pub reserved: bool,
}

const fn entry(code: &'static str, category: &'static str, vietnamese: &'static str) -> CategoryEntry {
    CategoryEntry {
        code,
        category,
        vietnamese,
        reserved: false,
    }
}

pub static DOMAINS: &[CategoryEntry] = &[
    entry("R", "religion", "Tôn giáo"),
    entry("L", "literature", "Văn học"),
    entry("H", "history", "Lịch sử"),
];

pub static SUB_DOMAINS: &[CategoryEntry] = &[
    entry("C", "catholic", "Công giáo"),
    entry("B", "buddhism", "Phật giáo"),
    entry("P", "protestant", "Tin Lành"),
    entry("G", "general", "Tổng quát"),
];

pub static GENRES: &[CategoryEntry] = &[
    entry("A", "article", "Bài viết"),
    entry("B", "book", "Sách"),
    entry("D", "document", "Văn kiện"),
    entry("N", "newTestament", "Tân Ước"),
    entry("O", "oldTestament", "Cựu Ước"),
    entry("P", "prayer", "Kinh nguyện"),
    entry("Q", "questionAnswer", "Hỏi đáp"),
    CategoryEntry {
        code: "Z",
        category: "reserved",
        vietnamese: "Dự phòng",
        reserved: true,
    },
];

pub static TAGS: &[CategoryEntry] = &[
    entry("", "theology", "Thần học"),
    entry("", "liturgy", "Phụng vụ"),
    entry("", "catechism", "Giáo lý"),
    entry("", "saints", "Các thánh"),
    entry("", "history", "Lịch sử"),
    entry("", "family", "Gia đình"),
    entry("", "spirituality", "Linh đạo"),
];

pub static LANGUAGES: &[CategoryEntry] = &[
    entry("vi", "vietnamese", "Tiếng Việt"),
    entry("en", "english", "Tiếng Anh"),
    entry("la", "latin", "Tiếng Latinh"),
    entry("fr", "french", "Tiếng Pháp"),
    entry("zh", "chinese", "Tiếng Trung"),
];

/// Finds a table entry by its category name
pub fn find_by_category<'a>(table: &'a [CategoryEntry], category: &str) -> Option<&'a CategoryEntry> {
    table.iter().find(|e| e.category == category)
}

/// Finds a table entry by its code
pub fn find_by_code<'a>(table: &'a [CategoryEntry], code: &str) -> Option<&'a CategoryEntry> {
    table.iter().find(|e| e.code == code)
}

/// Returns true if `code` is a known sentence language code
pub fn is_language_code(code: &str) -> bool {
    find_by_code(LANGUAGES, code).is_some()
}

/// Returns true if `label` is a known (Vietnamese) language label
pub fn is_language_label(label: &str) -> bool {
    LANGUAGES.iter().any(|e| e.vietnamese == label)
}

/// Top-level knowledge domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Domain {
    Religion,
    Literature,
    History,
}

/// Sub-domain within a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SubDomain {
    Catholic,
    Buddhism,
    Protestant,
    General,
}

/// Document genre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Genre {
    Article,
    Book,
    Document,
    NewTestament,
    OldTestament,
    Prayer,
    QuestionAnswer,
    Reserved,
}

impl Domain {
    pub fn code(&self) -> char {
        match self {
            Self::Religion => 'R',
            Self::Literature => 'L',
            Self::History => 'H',
        }
    }

    pub fn from_code(code: &str) -> Result<Self, ValidationError> {
        match code {
            "R" => Ok(Self::Religion),
            "L" => Ok(Self::Literature),
            "H" => Ok(Self::History),
            _ => Err(ValidationError::UnknownCode {
                kind: "domain",
                code: code.to_string(),
            }),
        }
    }
}

impl SubDomain {
    pub fn code(&self) -> char {
        match self {
            Self::Catholic => 'C',
            Self::Buddhism => 'B',
            Self::Protestant => 'P',
            Self::General => 'G',
        }
    }

    pub fn from_code(code: &str) -> Result<Self, ValidationError> {
        match code {
            "C" => Ok(Self::Catholic),
            "B" => Ok(Self::Buddhism),
            "P" => Ok(Self::Protestant),
            "G" => Ok(Self::General),
            _ => Err(ValidationError::UnknownCode {
                kind: "sub-domain",
                code: code.to_string(),
            }),
        }
    }
}

impl Genre {
    pub fn code(&self) -> char {
        match self {
            Self::Article => 'A',
            Self::Book => 'B',
            Self::Document => 'D',
            Self::NewTestament => 'N',
            Self::OldTestament => 'O',
            Self::Prayer => 'P',
            Self::QuestionAnswer => 'Q',
            Self::Reserved => 'Z',
        }
    }

    pub fn from_code(code: &str) -> Result<Self, ValidationError> {
        match code {
            "A" => Ok(Self::Article),
            "B" => Ok(Self::Book),
            "D" => Ok(Self::Document),
            "N" => Ok(Self::NewTestament),
            "O" => Ok(Self::OldTestament),
            "P" => Ok(Self::Prayer),
            "Q" => Ok(Self::QuestionAnswer),
            "Z" => Ok(Self::Reserved),
            _ => Err(ValidationError::UnknownCode {
                kind: "genre",
                code: code.to_string(),
            }),
        }
    }

    /// The genre table row for this code
    pub fn entry(&self) -> &'static CategoryEntry {
        let code = self.code().to_string();
        GENRES
            .iter()
            .find(|e| e.code == code)
            .unwrap_or(&GENRES[0])
    }

    pub fn is_reserved(&self) -> bool {
        self.entry().reserved
    }
}

macro_rules! code_conversions {
    ($($ty:ty),*) => {
        $(
            impl TryFrom<String> for $ty {
                type Error = ValidationError;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    Self::from_code(&value)
                }
            }

            impl From<$ty> for String {
                fn from(value: $ty) -> Self {
                    value.code().to_string()
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.code())
                }
            }
        )*
    };
}

code_conversions!(Domain, SubDomain, Genre);
