//! Page selection: `"all"` or 1-based lists and ranges like `"1,3-5"`.

use std::fmt;
use std::str::FromStr;

use crate::error::ExtractError;

/// Which pages of a document to scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    #[default]
    All,
    /// Inclusive 1-based `(start, end)` spans, in the order given.
    Spans(Vec<(usize, usize)>),
}

impl PageSelection {
    /// Resolve against a document's page count into sorted, de-duplicated
    /// 0-based page indices.
    pub fn resolve(&self, page_count: usize) -> Result<Vec<usize>, ExtractError> {
        let spans = match self {
            PageSelection::All => return Ok((0..page_count).collect()),
            PageSelection::Spans(spans) => spans,
        };

        let mut pages = Vec::new();
        for &(start, end) in spans {
            if start == 0 {
                return Err(ExtractError::PageRange(
                    "page 0 is invalid (pages start at 1)".to_string(),
                ));
            }
            if end > page_count {
                return Err(ExtractError::PageRange(format!(
                    "page {end} exceeds document page count ({page_count})"
                )));
            }
            pages.extend((start..=end).map(|p| p - 1));
        }
        pages.sort_unstable();
        pages.dedup();
        Ok(pages)
    }
}

impl FromStr for PageSelection {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.trim().eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        let mut spans = Vec::new();
        for part in input.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (start, end) = match part.split_once('-') {
                Some((start, end)) => (parse_page(start)?, parse_page(end)?),
                None => {
                    let page = parse_page(part)?;
                    (page, page)
                }
            };
            if start > end {
                return Err(format!("invalid page range: '{part}'"));
            }
            spans.push((start, end));
        }

        if spans.is_empty() {
            return Err("empty page selection".to_string());
        }
        Ok(PageSelection::Spans(spans))
    }
}

fn parse_page(text: &str) -> Result<usize, String> {
    let text = text.trim();
    let page: usize = text
        .parse()
        .map_err(|_| format!("invalid page number: '{text}'"))?;
    if page == 0 {
        return Err("page 0 is invalid (pages start at 1)".to_string());
    }
    Ok(page)
}

impl fmt::Display for PageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSelection::All => write!(f, "all"),
            PageSelection::Spans(spans) => {
                for (i, (start, end)) in spans.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    if start == end {
                        write!(f, "{start}")?;
                    } else {
                        write!(f, "{start}-{end}")?;
                    }
                }
                Ok(())
            }
        }
    }
}
