//! Merging scraped `(title, url)` pairs into bulk import text.
use regex::Regex;

/// Reserved trailing group for standalone MediUX links.
pub const MEDIUX_GROUP: &str = "MediUX URLs";
/// Reserved trailing group for standalone ThePosterDB links.
pub const TPDB_GROUP: &str = "The Poster DB URLs";

const MEDIUX_HOST: &str = "mediux.pro";
const TPDB_HOST: &str = "theposterdb.com";
const LEADING_ARTICLES: [&str; 3] = ["a", "an", "the"];

/// Removes the `--add-to-bulk` control flag the scraper tags its pushes with.
pub fn strip_add_to_bulk_flag(url: &str) -> String {
    match Regex::new(r"\s+--add-to-bulk\b") {
        Ok(flag) => flag.replace(url, "").trim().to_string(),
        Err(_) => url.trim().to_string(),
    }
}

/// First whitespace-delimited token of a bulk line.
pub fn bare_url(url: &str) -> &str {
    url.split_whitespace().next().unwrap_or("")
}

/// True when `url` already sits on its own line in `text`, optionally followed by flags.
pub fn contains_url(text: &str, url: &str) -> bool {
    let bare = bare_url(url);
    if bare.is_empty() {
        return false;
    }
    let pattern = format!(r"(?m)^{}(\s+--\S+(\s+\S+)*)?\r?$", regex::escape(bare));
    Regex::new(&pattern).is_ok_and(|line| line.is_match(text))
}

/// Plain append used when automatic bulk management is off.
pub fn append_entry(text: &str, title: &str, url: &str) -> String {
    format!("{text}\n// {title}\n{url}\n")
}

/// Case-insensitive sort key with one leading article dropped.
pub fn title_sort_key(title: &str) -> String {
    let lowered = title.to_lowercase();
    let mut words: Vec<&str> = lowered.split(' ').collect();
    if words.len() > 1 && LEADING_ARTICLES.contains(&words[0]) {
        words.remove(0);
    }
    words.join(" ")
}

#[derive(Default)]
struct Groups {
    preamble: Vec<String>,
    titled: Vec<(String, Vec<String>)>,
    mediux: Vec<String>,
    tpdb: Vec<String>,
}

impl Groups {
    fn parse(text: &str) -> Self {
        let mut groups = Groups::default();
        let mut current: Option<usize> = None;
        let mut reserved: Option<&'static str> = None;

        for line in text.lines().map(str::trim) {
            if let Some(title) = line.strip_prefix("//") {
                let title = title.trim();
                current = None;
                reserved = None;
                if title == MEDIUX_GROUP {
                    reserved = Some(MEDIUX_GROUP);
                } else if title == TPDB_GROUP {
                    reserved = Some(TPDB_GROUP);
                } else if !title.is_empty() {
                    current = Some(groups.group_index(title));
                }
            } else if line.is_empty() {
                current = None;
                reserved = None;
            } else if let Some(index) = current {
                groups.titled[index].1.push(line.to_string());
            } else if line.starts_with('#') && groups.is_empty() {
                groups.preamble.push(line.to_string());
            } else if reserved == Some(MEDIUX_GROUP) || line.contains(MEDIUX_HOST) {
                groups.mediux.push(line.to_string());
            } else if reserved == Some(TPDB_GROUP) || line.contains(TPDB_HOST) {
                groups.tpdb.push(line.to_string());
            }
        }
        groups
    }

    fn is_empty(&self) -> bool {
        self.titled.is_empty() && self.mediux.is_empty() && self.tpdb.is_empty()
    }

    fn group_index(&mut self, title: &str) -> usize {
        match self.titled.iter().position(|(existing, _)| existing == title) {
            Some(index) => index,
            None => {
                self.titled.push((title.to_string(), Vec::new()));
                self.titled.len() - 1
            }
        }
    }

    fn render(mut self) -> String {
        self.titled
            .sort_by_cached_key(|(title, _)| title_sort_key(title));

        let mut output = String::new();
        if !self.preamble.is_empty() {
            for line in &self.preamble {
                output.push_str(line);
                output.push('\n');
            }
            output.push('\n');
        }
        for (title, urls) in &self.titled {
            push_group(&mut output, title, urls);
        }
        if !self.mediux.is_empty() {
            push_group(&mut output, MEDIUX_GROUP, &self.mediux);
        }
        if !self.tpdb.is_empty() {
            push_group(&mut output, TPDB_GROUP, &self.tpdb);
        }
        output
    }
}

fn push_group(output: &mut String, title: &str, urls: &[String]) {
    output.push_str("// ");
    output.push_str(title);
    output.push('\n');
    for url in urls {
        output.push_str(url);
        output.push('\n');
    }
    output.push('\n');
}

/// Re-groups `text` by title, adds the new pair and sorts groups alphabetically.
///
/// Standalone MediUX and ThePosterDB links are collected into the two reserved
/// groups, which always come last. Other standalone lines are dropped.
pub fn merge_sorted(text: &str, title: &str, url: &str) -> String {
    let mut groups = Groups::parse(text);
    let title = title.trim();
    let url = url.trim();
    if !title.is_empty() && !url.is_empty() {
        let index = groups.group_index(title);
        groups.titled[index].1.push(url.to_string());
    }
    groups.render()
}
