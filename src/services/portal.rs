// src/services/portal.rs

//! Séneca portal client.
//!
//! Logs into the portal over plain HTTP (cookie session), locates the
//! pending messages view by link text and extracts the messages table.
//! The lookup heuristics mirror the portal's quirks; they stay behind
//! [`MessageSource`](crate::services::MessageSource) so the pipeline
//! never sees them.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::PortalConfig;
use crate::error::{AppError, Result};
use crate::models::Record;
use crate::services::MessageSource;

/// HTTP client for the school portal.
pub struct PortalClient {
    config: PortalConfig,
    client: Client,
}

/// A fetched page: its final URL after redirects and the raw HTML.
struct Page {
    url: Url,
    html: String,
}

/// A login form located in a page.
#[derive(Debug)]
struct LoginForm {
    /// Form action, relative to the page it appeared on
    action: Option<String>,
    /// Hidden fields to carry through the POST
    hidden: Vec<(String, String)>,
    username_field: String,
    password_field: String,
}

impl PortalClient {
    /// Create a new portal client with the given configuration.
    pub fn new(config: PortalConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_store(true)
            .build()?;

        Ok(Self { config, client })
    }

    /// GET a page, following redirects.
    async fn fetch_page(&self, url: &str) -> Result<Page> {
        let response = self.client.get(url).send().await?;
        let url = response.url().clone();
        let html = response.text().await?;
        Ok(Page { url, html })
    }

    /// Log in and return the landing page.
    async fn login(&self) -> Result<Page> {
        let page = self.fetch_page(&self.config.login_url).await?;

        let form = find_login_form(
            &Html::parse_document(&page.html),
            &self.config.username_fields,
            &self.config.password_fields,
        )
        .ok_or_else(|| AppError::login("no login form found on the portal page"))?;

        log::debug!(
            "Posting credentials via fields '{}' / '{}'",
            form.username_field,
            form.password_field
        );

        let action = resolve_href(&page.url, form.action.as_deref().unwrap_or(""));
        let mut fields = form.hidden;
        fields.push((form.username_field, self.config.username.clone()));
        fields.push((form.password_field, self.config.password.clone()));

        let response = self.client.post(action).form(&fields).send().await?;
        let url = response.url().clone();
        let html = response.text().await?;

        if !self.login_succeeded(&url) {
            return Err(AppError::login(format!(
                "portal did not accept the session (landed on {url})"
            )));
        }

        Ok(Page { url, html })
    }

    /// Check the post-login URL against the configured success markers.
    fn login_succeeded(&self, landing: &Url) -> bool {
        let url = landing.as_str().to_lowercase();
        if landing.as_str() == self.config.login_url || url.contains("error") {
            return false;
        }
        self.config
            .success_markers
            .iter()
            .any(|marker| url.contains(&marker.to_lowercase()))
    }

    /// Locate and fetch the pending messages view.
    async fn open_messages_view(&self, landing: &Page) -> Result<Page> {
        let href = find_messages_link(
            &Html::parse_document(&landing.html),
            &self.config.messages_link_text,
            &self.config.messages_link_keyword,
            &self.config.messages_link_fallback,
        )
        .ok_or_else(|| AppError::navigation("pending messages link not found after login"))?;

        let target = resolve_href(&landing.url, &href);
        log::info!("Opening messages view at {target}");
        self.fetch_page(&target).await
    }

    /// Extract message records from the messages view.
    fn extract_records(&self, html: &str) -> Vec<Record> {
        let document = Html::parse_document(html);
        let table_sel = sel("table");
        let tables: Vec<ElementRef> = document.select(&table_sel).collect();

        match tables.get(self.config.table.table_index) {
            Some(table) => self.records_from_table(table),
            None => {
                log::warn!(
                    "Messages table not found (page has {} table(s)), scanning rows loosely",
                    tables.len()
                );
                self.records_from_any_rows(&document)
            }
        }
    }

    /// Extract records from the known table layout.
    fn records_from_table(&self, table: &ElementRef<'_>) -> Vec<Record> {
        let row_sel = sel("tr");
        let cell_sel = sel("td");
        let layout = &self.config.table;
        let needed = layout
            .date_cell
            .max(layout.title_cell)
            .max(layout.sender_cell)
            .max(layout.read_cell);

        let rows: Vec<ElementRef> = table.select(&row_sel).collect();
        // first row is the header when the table has more than one
        let start = if rows.len() > 1 { 1 } else { 0 };

        let mut records = Vec::new();
        for row in rows.iter().skip(start) {
            let cells: Vec<String> = row.select(&cell_sel).map(|c| collect_text(&c)).collect();
            if cells.is_empty() {
                continue;
            }

            let mut date_text = String::new();
            let mut title = String::new();
            let mut sender = String::new();
            let mut read_date = String::new();

            if cells.len() > needed {
                date_text = cells.get(layout.date_cell).cloned().unwrap_or_default();
                title = cells.get(layout.title_cell).cloned().unwrap_or_default();
                sender = cells.get(layout.sender_cell).cloned().unwrap_or_default();
                read_date = cells.get(layout.read_cell).cloned().unwrap_or_default();
            }

            if title.is_empty() {
                title = fallback_title(&cells).unwrap_or_default();
            }

            if title.chars().count() <= layout.min_title_len {
                continue;
            }

            let body = compose_body(&date_text, &sender, &read_date);
            records.push(Record {
                title,
                body,
                date_text,
                observed_at: Utc::now(),
            });
        }
        records
    }

    /// Last-resort extraction: any table row with data cells.
    fn records_from_any_rows(&self, document: &Html) -> Vec<Record> {
        let row_sel = sel("tr");
        let cell_sel = sel("td");

        let mut records = Vec::new();
        for row in document.select(&row_sel) {
            if row.select(&cell_sel).next().is_none() {
                continue;
            }
            let text = collect_text(&row);
            if text.chars().count() <= 10 {
                continue;
            }

            let words: Vec<&str> = text.split_whitespace().collect();
            let title = if words.len() >= 6 {
                words[..6].join(" ")
            } else {
                text.clone()
            };

            records.push(Record {
                title,
                body: text,
                date_text: String::new(),
                observed_at: Utc::now(),
            });
        }
        records
    }
}

#[async_trait]
impl MessageSource for PortalClient {
    async fn fetch(&self) -> Result<Vec<Record>> {
        log::info!("Logging into {}", self.config.login_url);
        let landing = self.login().await?;
        log::info!("Login accepted, landed on {}", landing.url);

        let messages = self.open_messages_view(&landing).await?;
        let records = self.extract_records(&messages.html);
        log::info!("Extracted {} message row(s)", records.len());
        Ok(records)
    }
}

/// Parse a CSS selector that is known valid at compile time.
fn sel(selector: &str) -> Selector {
    Selector::parse(selector).expect("static selector")
}

/// Concatenated, whitespace-normalized text of an element.
fn collect_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve a possibly-relative href against the page it appeared on.
fn resolve_href(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Find the login form, trying the configured field names first and
/// falling back to the first text/email and password inputs.
fn find_login_form(
    document: &Html,
    username_fields: &[String],
    password_fields: &[String],
) -> Option<LoginForm> {
    let form_sel = sel("form");
    let input_sel = sel("input");

    for form in document.select(&form_sel) {
        let inputs: Vec<ElementRef> = form.select(&input_sel).collect();
        if let Some((username_field, password_field)) =
            resolve_login_fields(&inputs, username_fields, password_fields)
        {
            return Some(LoginForm {
                action: form.value().attr("action").map(str::to_string),
                hidden: hidden_fields(&inputs, &username_field, &password_field),
                username_field,
                password_field,
            });
        }
    }

    // Some portal revisions render the inputs outside any form tag; scan
    // the whole document and post back to the page itself.
    let inputs: Vec<ElementRef> = document.select(&input_sel).collect();
    resolve_login_fields(&inputs, username_fields, password_fields).map(
        |(username_field, password_field)| LoginForm {
            action: None,
            hidden: hidden_fields(&inputs, &username_field, &password_field),
            username_field,
            password_field,
        },
    )
}

/// Pick the user name and password field names from a set of inputs.
fn resolve_login_fields(
    inputs: &[ElementRef<'_>],
    username_fields: &[String],
    password_fields: &[String],
) -> Option<(String, String)> {
    let username = username_fields
        .iter()
        .find_map(|candidate| named_input(inputs, candidate))
        .or_else(|| first_input_of_type(inputs, &["text", "email"]))?;
    let password = password_fields
        .iter()
        .find_map(|candidate| named_input(inputs, candidate))
        .or_else(|| first_input_of_type(inputs, &["password"]))?;
    Some((username, password))
}

/// Find an input by name or id; the returned value is always the name
/// attribute, which is what the POST needs.
fn named_input(inputs: &[ElementRef<'_>], candidate: &str) -> Option<String> {
    inputs.iter().find_map(|input| {
        let el = input.value();
        if el.attr("name") == Some(candidate) || el.attr("id") == Some(candidate) {
            el.attr("name").map(str::to_string)
        } else {
            None
        }
    })
}

/// First named input whose type is one of `types` (untyped inputs count
/// as "text").
fn first_input_of_type(inputs: &[ElementRef<'_>], types: &[&str]) -> Option<String> {
    inputs.iter().find_map(|input| {
        let el = input.value();
        let ty = el.attr("type").unwrap_or("text").to_lowercase();
        if types.contains(&ty.as_str()) {
            el.attr("name").map(str::to_string)
        } else {
            None
        }
    })
}

/// Hidden fields to replay with the credentials, in document order.
fn hidden_fields(
    inputs: &[ElementRef<'_>],
    username_field: &str,
    password_field: &str,
) -> Vec<(String, String)> {
    inputs
        .iter()
        .filter(|input| {
            input
                .value()
                .attr("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
        })
        .filter_map(|input| {
            let el = input.value();
            let name = el.attr("name")?;
            if name == username_field || name == password_field {
                return None;
            }
            Some((name.to_string(), el.attr("value").unwrap_or("").to_string()))
        })
        .collect()
}

/// Find the href of the pending messages link: exact link text first,
/// then a case-insensitive keyword match, then the last-resort portal
/// token, each pass in document order.
fn find_messages_link(
    document: &Html,
    exact: &str,
    keyword: &str,
    fallback: &str,
) -> Option<String> {
    let anchor_sel = sel("a[href]");
    let anchors: Vec<(String, String)> = document
        .select(&anchor_sel)
        .filter_map(|a| {
            let href = a.value().attr("href")?.trim();
            // anchors we cannot follow over plain HTTP
            if href.is_empty()
                || href.starts_with('#')
                || href.to_lowercase().starts_with("javascript:")
            {
                return None;
            }
            Some((collect_text(&a), href.to_string()))
        })
        .collect();

    let keyword = keyword.to_lowercase();
    let fallback = fallback.to_lowercase();
    anchors
        .iter()
        .find(|(text, _)| text.as_str() == exact)
        .or_else(|| {
            anchors
                .iter()
                .find(|(text, _)| text.to_lowercase().contains(&keyword))
        })
        .or_else(|| {
            anchors
                .iter()
                .find(|(text, _)| text.to_lowercase().contains(&fallback))
        })
        .map(|(_, href)| href.clone())
}

/// First cell that reads like a subject rather than a counter or a date.
fn fallback_title(cells: &[String]) -> Option<String> {
    cells
        .iter()
        .find(|text| text.chars().count() > 5 && !text.starts_with('0') && !text.contains('/'))
        .cloned()
}

/// Compose the body text shown in notifications: entry date, sender and
/// read state, one per line.
fn compose_body(date_text: &str, sender: &str, read_date: &str) -> String {
    let mut parts = Vec::new();
    if !date_text.is_empty() {
        parts.push(format!("📅 Fecha: {date_text}"));
    }
    if !sender.is_empty() {
        parts.push(format!("👤 Remitido por: {sender}"));
    }
    if read_date.is_empty() {
        parts.push("📢 Mensaje nuevo".to_string());
    } else {
        parts.push(format!("👀 Leído: {read_date}"));
    }
    parts.join("\n")
}
