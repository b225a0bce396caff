//! Tool catalog: accept policies, target formats and option schemas.
use std::fmt;
use std::str::FromStr;

use crate::DeskError;

const MB: u64 = 1024 * 1024;

/// Option key shared by every tool; always one of the tool's target formats.
pub const OUTPUT_FORMAT: &str = "output_format";

const PDF_MIME: &[&str] = &["application/pdf"];
const PDF_EXT: &[&str] = &["pdf"];

const QUALITY_LEVELS: &[&str] = &["low", "medium", "high"];
const ORIENTATIONS: &[&str] = &["portrait", "landscape"];
const PAGE_SIZES: &[&str] = &["A4", "Letter", "Legal"];
const SIGNATURE_POSITIONS: &[&str] = &[
    "bottom-right",
    "bottom-left",
    "top-right",
    "top-left",
    "center",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ToolKey {
    #[default]
    PdfToWord,
    PdfToImage,
    PdfToExcel,
    WordToPdf,
    ImageToPdf,
    ExcelToPdf,
    Compress,
    Sign,
    Edit,
}

impl ToolKey {
    pub const ALL: [ToolKey; 9] = [
        ToolKey::PdfToWord,
        ToolKey::PdfToImage,
        ToolKey::PdfToExcel,
        ToolKey::WordToPdf,
        ToolKey::ImageToPdf,
        ToolKey::ExcelToPdf,
        ToolKey::Compress,
        ToolKey::Sign,
        ToolKey::Edit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolKey::PdfToWord => "pdf-to-word",
            ToolKey::PdfToImage => "pdf-to-image",
            ToolKey::PdfToExcel => "pdf-to-excel",
            ToolKey::WordToPdf => "word-to-pdf",
            ToolKey::ImageToPdf => "image-to-pdf",
            ToolKey::ExcelToPdf => "excel-to-pdf",
            ToolKey::Compress => "compress",
            ToolKey::Sign => "sign",
            ToolKey::Edit => "edit",
        }
    }

    pub fn spec(self) -> &'static ToolSpec {
        match self {
            ToolKey::PdfToWord => &PDF_TO_WORD,
            ToolKey::PdfToImage => &PDF_TO_IMAGE,
            ToolKey::PdfToExcel => &PDF_TO_EXCEL,
            ToolKey::WordToPdf => &WORD_TO_PDF,
            ToolKey::ImageToPdf => &IMAGE_TO_PDF,
            ToolKey::ExcelToPdf => &EXCEL_TO_PDF,
            ToolKey::Compress => &COMPRESS,
            ToolKey::Sign => &SIGN,
            ToolKey::Edit => &EDIT,
        }
    }
}

impl fmt::Display for ToolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolKey {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ToolKey::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DeskError::UnknownTool(wanted.to_string()))
    }
}

/// Which files a tool takes in.
///
/// A candidate passes the type check when either its MIME type or its
/// extension is listed. MIME entries ending in `/*` match a whole family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptPolicy {
    pub mime_types: &'static [&'static str],
    pub extensions: &'static [&'static str],
    pub max_size_bytes: u64,
    pub max_count: Option<usize>,
}

impl AcceptPolicy {
    pub fn accepts_type(&self, extension: Option<&str>, mime_type: Option<&str>) -> bool {
        let ext_ok = extension.is_some_and(|ext| {
            self.extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        });
        ext_ok || mime_type.is_some_and(|mime| self.accepts_mime(mime))
    }

    fn accepts_mime(&self, mime: &str) -> bool {
        let essence = mime.split(';').next().unwrap_or(mime).trim();
        self.mime_types.iter().any(|allowed| match allowed.strip_suffix("/*") {
            Some(family) => essence
                .split_once('/')
                .is_some_and(|(top, _)| top.eq_ignore_ascii_case(family)),
            None => allowed.eq_ignore_ascii_case(essence),
        })
    }

    /// Human-readable list of accepted extensions, e.g. `.pdf, .docx`.
    pub fn describe_extensions(&self) -> String {
        self.extensions
            .iter()
            .map(|ext| format!(".{ext}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Closed set; values outside `allowed` are ignored.
    Choice {
        allowed: &'static [&'static str],
        default: &'static str,
    },
    Flag { default: bool },
    /// Free-form number (scale, DPI, page index).
    Integer { default: i64 },
    /// Free-form text (page ranges, watermark text).
    Text { default: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub key: &'static str,
    pub kind: OptionKind,
}

/// How a simulated result size is derived from its source size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeRule {
    Fixed(f64),
    /// Multiplier picked by the value of a choice option.
    ByChoice {
        key: &'static str,
        factors: &'static [(&'static str, f64)],
    },
}

#[derive(Debug, PartialEq)]
pub struct ToolSpec {
    pub key: ToolKey,
    pub label: &'static str,
    pub accept: AcceptPolicy,
    pub target_formats: &'static [&'static str],
    pub default_format: &'static str,
    pub options: &'static [OptionSpec],
    pub size_rule: SizeRule,
    /// Whether accepted files get a preview handle.
    pub previews: bool,
}

impl ToolSpec {
    /// Schema for `key`, including the implicit output format choice.
    pub fn option_kind(&self, key: &str) -> Option<OptionKind> {
        if key == OUTPUT_FORMAT {
            return Some(OptionKind::Choice {
                allowed: self.target_formats,
                default: self.default_format,
            });
        }
        self.options
            .iter()
            .find(|spec| spec.key == key)
            .map(|spec| spec.kind)
    }

    pub fn size_factor(&self, choice: impl Fn(&str) -> Option<String>) -> f64 {
        match self.size_rule {
            SizeRule::Fixed(factor) => factor,
            SizeRule::ByChoice { key, factors } => {
                let selected = choice(key).or_else(|| match self.option_kind(key) {
                    Some(OptionKind::Choice { default, .. }) => Some(default.to_string()),
                    _ => None,
                });
                selected
                    .and_then(|value| {
                        factors
                            .iter()
                            .find(|(name, _)| name.eq_ignore_ascii_case(&value))
                            .map(|(_, factor)| *factor)
                    })
                    .unwrap_or(1.0)
            }
        }
    }
}

const QUALITY: OptionSpec = OptionSpec {
    key: "quality",
    kind: OptionKind::Choice {
        allowed: QUALITY_LEVELS,
        default: "medium",
    },
};

const PAGE_RANGE: OptionSpec = OptionSpec {
    key: "page_range",
    kind: OptionKind::Text { default: "" },
};

static PDF_TO_WORD: ToolSpec = ToolSpec {
    key: ToolKey::PdfToWord,
    label: "PDF to Word",
    accept: AcceptPolicy {
        mime_types: PDF_MIME,
        extensions: PDF_EXT,
        max_size_bytes: 50 * MB,
        max_count: None,
    },
    target_formats: &["DOCX", "DOC", "RTF", "TXT"],
    default_format: "DOCX",
    options: &[
        QUALITY,
        OptionSpec {
            key: "ocr",
            kind: OptionKind::Flag { default: false },
        },
        PAGE_RANGE,
    ],
    size_rule: SizeRule::ByChoice {
        key: "quality",
        factors: &[("low", 0.6), ("medium", 0.8), ("high", 1.0)],
    },
    previews: false,
};

static PDF_TO_IMAGE: ToolSpec = ToolSpec {
    key: ToolKey::PdfToImage,
    label: "PDF to Image",
    accept: AcceptPolicy {
        mime_types: PDF_MIME,
        extensions: PDF_EXT,
        max_size_bytes: 50 * MB,
        max_count: None,
    },
    target_formats: &["JPG", "PNG", "TIFF", "WEBP"],
    default_format: "JPG",
    options: &[
        OptionSpec {
            key: "quality",
            kind: OptionKind::Choice {
                allowed: QUALITY_LEVELS,
                default: "high",
            },
        },
        OptionSpec {
            key: "dpi",
            kind: OptionKind::Integer { default: 150 },
        },
        PAGE_RANGE,
    ],
    size_rule: SizeRule::ByChoice {
        key: "quality",
        factors: &[("low", 0.5), ("medium", 1.0), ("high", 2.0)],
    },
    previews: false,
};

static PDF_TO_EXCEL: ToolSpec = ToolSpec {
    key: ToolKey::PdfToExcel,
    label: "PDF to Excel",
    accept: AcceptPolicy {
        mime_types: PDF_MIME,
        extensions: PDF_EXT,
        max_size_bytes: 50 * MB,
        max_count: None,
    },
    target_formats: &["XLSX", "CSV"],
    default_format: "XLSX",
    options: &[QUALITY, PAGE_RANGE],
    size_rule: SizeRule::Fixed(0.7),
    previews: false,
};

static WORD_TO_PDF: ToolSpec = ToolSpec {
    key: ToolKey::WordToPdf,
    label: "Word to PDF",
    accept: AcceptPolicy {
        mime_types: &[
            "application/msword",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "application/rtf",
            "application/vnd.oasis.opendocument.text",
        ],
        extensions: &["doc", "docx", "rtf", "odt"],
        max_size_bytes: 50 * MB,
        max_count: None,
    },
    target_formats: &["PDF"],
    default_format: "PDF",
    options: &[QUALITY],
    size_rule: SizeRule::ByChoice {
        key: "quality",
        factors: &[("low", 0.9), ("medium", 1.1), ("high", 1.3)],
    },
    previews: false,
};

static IMAGE_TO_PDF: ToolSpec = ToolSpec {
    key: ToolKey::ImageToPdf,
    label: "Image to PDF",
    accept: AcceptPolicy {
        mime_types: &["image/*"],
        extensions: &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff"],
        max_size_bytes: 20 * MB,
        max_count: Some(20),
    },
    target_formats: &["PDF"],
    default_format: "PDF",
    options: &[
        OptionSpec {
            key: "page_size",
            kind: OptionKind::Choice {
                allowed: PAGE_SIZES,
                default: "A4",
            },
        },
        OptionSpec {
            key: "orientation",
            kind: OptionKind::Choice {
                allowed: ORIENTATIONS,
                default: "portrait",
            },
        },
        OptionSpec {
            key: "margin",
            kind: OptionKind::Integer { default: 10 },
        },
    ],
    size_rule: SizeRule::Fixed(1.05),
    previews: true,
};

static EXCEL_TO_PDF: ToolSpec = ToolSpec {
    key: ToolKey::ExcelToPdf,
    label: "Excel to PDF",
    accept: AcceptPolicy {
        mime_types: &[
            "application/vnd.ms-excel",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "text/csv",
        ],
        extensions: &["xls", "xlsx", "csv"],
        max_size_bytes: 25 * MB,
        max_count: None,
    },
    target_formats: &["PDF"],
    default_format: "PDF",
    options: &[
        QUALITY,
        OptionSpec {
            key: "orientation",
            kind: OptionKind::Choice {
                allowed: ORIENTATIONS,
                default: "landscape",
            },
        },
        OptionSpec {
            key: "fit_to_page",
            kind: OptionKind::Flag { default: true },
        },
        OptionSpec {
            key: "gridlines",
            kind: OptionKind::Flag { default: false },
        },
    ],
    size_rule: SizeRule::ByChoice {
        key: "quality",
        factors: &[("low", 1.1), ("medium", 1.3), ("high", 1.5)],
    },
    previews: false,
};

static COMPRESS: ToolSpec = ToolSpec {
    key: ToolKey::Compress,
    label: "Compress PDF",
    accept: AcceptPolicy {
        mime_types: PDF_MIME,
        extensions: PDF_EXT,
        max_size_bytes: 100 * MB,
        max_count: Some(10),
    },
    target_formats: &["PDF"],
    default_format: "PDF",
    options: &[
        OptionSpec {
            key: "compression",
            kind: OptionKind::Choice {
                allowed: QUALITY_LEVELS,
                default: "medium",
            },
        },
        OptionSpec {
            key: "resize",
            kind: OptionKind::Flag { default: true },
        },
        OptionSpec {
            key: "image_quality",
            kind: OptionKind::Integer { default: 75 },
        },
        OptionSpec {
            key: "strip_metadata",
            kind: OptionKind::Flag { default: false },
        },
    ],
    size_rule: SizeRule::ByChoice {
        key: "compression",
        factors: &[("low", 0.8), ("medium", 0.6), ("high", 0.4)],
    },
    previews: false,
};

static SIGN: ToolSpec = ToolSpec {
    key: ToolKey::Sign,
    label: "Sign PDF",
    accept: AcceptPolicy {
        mime_types: PDF_MIME,
        extensions: PDF_EXT,
        max_size_bytes: 25 * MB,
        max_count: Some(1),
    },
    target_formats: &["PDF"],
    default_format: "PDF",
    options: &[
        OptionSpec {
            key: "signature_text",
            kind: OptionKind::Text { default: "" },
        },
        OptionSpec {
            key: "position",
            kind: OptionKind::Choice {
                allowed: SIGNATURE_POSITIONS,
                default: "bottom-right",
            },
        },
        OptionSpec {
            key: "page",
            kind: OptionKind::Integer { default: 1 },
        },
        OptionSpec {
            key: "include_date",
            kind: OptionKind::Flag { default: true },
        },
    ],
    size_rule: SizeRule::Fixed(1.02),
    previews: false,
};

static EDIT: ToolSpec = ToolSpec {
    key: ToolKey::Edit,
    label: "Edit PDF",
    accept: AcceptPolicy {
        mime_types: PDF_MIME,
        extensions: PDF_EXT,
        max_size_bytes: 50 * MB,
        max_count: Some(1),
    },
    target_formats: &["PDF"],
    default_format: "PDF",
    options: &[
        OptionSpec {
            key: "rotate",
            kind: OptionKind::Integer { default: 0 },
        },
        OptionSpec {
            key: "watermark",
            kind: OptionKind::Text { default: "" },
        },
        OptionSpec {
            key: "flatten",
            kind: OptionKind::Flag { default: false },
        },
    ],
    size_rule: SizeRule::Fixed(1.0),
    previews: false,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_default_format_is_a_target_format() {
        for key in ToolKey::ALL {
            let spec = key.spec();
            assert_eq!(spec.key, key);
            assert!(
                spec.target_formats.contains(&spec.default_format),
                "{key} default format missing from targets"
            );
        }
    }

    #[test]
    fn tool_keys_parse_case_insensitively() {
        assert_eq!("Excel-To-PDF".parse::<ToolKey>().unwrap(), ToolKey::ExcelToPdf);
        assert!(matches!(
            "pdf-to-midi".parse::<ToolKey>(),
            Err(DeskError::UnknownTool(name)) if name == "pdf-to-midi"
        ));
    }

    #[test]
    fn mime_wildcards_match_family_only() {
        let accept = ToolKey::ImageToPdf.spec().accept;
        assert!(accept.accepts_type(None, Some("image/png")));
        assert!(accept.accepts_type(None, Some("IMAGE/JPEG; q=1")));
        assert!(!accept.accepts_type(None, Some("application/pdf")));
        assert!(accept.accepts_type(Some("JPG"), None));
    }

    #[test]
    fn size_factor_falls_back_to_choice_default() {
        let spec = ToolKey::ExcelToPdf.spec();
        assert_eq!(spec.size_factor(|_| None), 1.3);
        assert_eq!(spec.size_factor(|_| Some("high".into())), 1.5);
        assert_eq!(spec.size_factor(|_| Some("bogus".into())), 1.0);
    }
}
