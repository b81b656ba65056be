// Copyright 2022 jmjoy
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Response composition.
//!
//! [`respond`] runs one request end to end: session first, then the body,
//! then the page. Decode and read problems are rendered as diagnostics on
//! the page; only a failure to build the response itself is an error.

use crate::{
    Config, Params, ProbeResult,
    body::{BodyBytes, ReadStatus},
    config::PreviewConfig,
    decode::{self, DecodeStatus, FormData},
    form::{FieldCollection, FieldValue},
    id::GenerateSessionId,
    meta::RequestMetadata,
    preview,
    request::Request,
    response::Response,
    session::{Session, SessionManager},
};
use std::{fmt::Write as _, io::Read};
use tracing::{info, warn};

const CONTENT_TYPE: &str = "text/html; charset=utf-8";
const CACHE_CONTROL: &str = "no-cache, no-store, must-revalidate";

/// Buttons of the session form, sent as the `action` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    SetData,
    ClearSession,
}

impl FormAction {
    pub fn from_fields(fields: &FieldCollection) -> Option<Self> {
        match fields.text("action")? {
            "set_data" => Some(FormAction::SetData),
            "clear_session" => Some(FormAction::ClearSession),
            _ => None,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            FormAction::SetData => "Session data would be set (simulated)",
            FormAction::ClearSession => "Session cleared and new session started",
        }
    }
}

/// Everything the page shows.
pub struct Report<'a> {
    pub params: &'a Params<'a>,
    pub meta: &'a RequestMetadata,
    pub session: &'a Session,
    pub body: &'a BodyBytes,
    pub form: &'a FormData,
    pub query: &'a FieldCollection,
    pub message: Option<&'a str>,
    pub preview: &'a PreviewConfig,
}

/// Handles one CGI request read from `stdin` and builds the response.
pub fn respond<R: Read, G: GenerateSessionId>(
    params: &Params<'_>, stdin: R, config: &Config, sessions: &mut SessionManager<G>,
) -> ProbeResult<Response> {
    let meta = RequestMetadata::from_params(params);
    let mut session = sessions.resolve(meta.cookie_header());

    let body = if meta.has_body() {
        Request::new(&meta, stdin).read_body(config.max_body_bytes)
    } else {
        BodyBytes::empty()
    };

    let form = decode::decode(&meta, &body);
    for note in &form.notes {
        warn!(%note, "Form decoding note.");
    }
    if let DecodeStatus::Failed(err) = &form.status {
        warn!(error = %err, "Form data could not be decoded.");
    }

    let action = FormAction::from_fields(&form.fields);
    if action == Some(FormAction::ClearSession) {
        session = sessions.clear(&session);
    }

    let query = decode::decode_query(meta.query_string());

    info!(
        method = meta.method(),
        session_new = session.is_new,
        fields = form.fields.len(),
        status = ?form.status,
        "Handled request."
    );

    let report = Report {
        params,
        meta: &meta,
        session: &session,
        body: &body,
        form: &form,
        query: &query,
        message: action.map(FormAction::message),
        preview: &config.preview,
    };

    let mut response = Response::new(CONTENT_TYPE)?;
    response.insert_header("Cache-Control", CACHE_CONTROL)?;
    if let Some(cookie) = sessions.set_cookie(&session) {
        response.insert_header("Set-Cookie", cookie.to_string())?;
    }
    response.append_body(render(&report));
    Ok(response)
}

/// Renders the diagnostic page.
pub fn render(report: &Report<'_>) -> String {
    let mut html = String::new();
    html.push_str(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>CGI Probe</title>\n</head>\n<body>\n<h1>CGI Probe</h1>\n",
    );

    render_session(&mut html, report);
    if let Some(message) = report.message {
        let _ = writeln!(html, "<div class=\"message\">{}</div>", escape(message));
    }
    render_request(&mut html, report);
    render_form(&mut html, report);
    render_query(&mut html, report.query);
    render_body(&mut html, report.body, report.preview);
    render_env(&mut html, report.params);

    html.push_str("</body>\n</html>\n");
    html
}

fn render_session(html: &mut String, report: &Report<'_>) {
    let status = if report.session.is_new {
        "New Session"
    } else {
        "Existing Session"
    };
    let cookie = report
        .meta
        .cookie_header()
        .filter(|cookie| !cookie.is_empty())
        .unwrap_or("No cookies received");

    let _ = write!(
        html,
        "<div class=\"section\">\n<h2>Session</h2>\n\
         <p><strong>Session ID:</strong> <code>{}</code></p>\n\
         <p><strong>Session Status:</strong> {}</p>\n\
         <p><strong>Cookie Header:</strong> <code>{}</code></p>\n</div>\n",
        escape(&report.session.id),
        status,
        escape(cookie),
    );
}

fn render_request(html: &mut String, report: &Report<'_>) {
    let var = |name: &str| escape(report.params.var(name).unwrap_or("Unknown"));
    let _ = write!(
        html,
        "<div class=\"section\">\n<h2>Request</h2>\n\
         <p><strong>Request Method:</strong> {}</p>\n\
         <p><strong>Content Type:</strong> {}</p>\n\
         <p><strong>Server Software:</strong> {}</p>\n\
         <p><strong>Gateway Interface:</strong> {}</p>\n\
         <p><strong>User Agent:</strong> {}</p>\n</div>\n",
        escape(report.meta.method()),
        escape(report.meta.content_type().unwrap_or("-")),
        var("SERVER_SOFTWARE"),
        var("GATEWAY_INTERFACE"),
        var("HTTP_USER_AGENT"),
    );
}

fn render_form(html: &mut String, report: &Report<'_>) {
    let form = report.form;
    html.push_str("<div class=\"section\">\n<h2>Form Data</h2>\n");

    let summary = match &form.status {
        DecodeStatus::Decoded if form.fields.is_empty() => "No fields submitted.".to_string(),
        DecodeStatus::Decoded => format!("Form has {} field(s).", form.fields.len()),
        DecodeStatus::NoBody => format!(
            "{} requests carry no form body.",
            escape(report.meta.method())
        ),
        DecodeStatus::Empty => "No fields submitted.".to_string(),
        DecodeStatus::Unsupported { content_type } => format!(
            "Body of type <code>{}</code> is not form data.",
            escape(content_type)
        ),
        DecodeStatus::Failed(err) => format!(
            "<span class=\"error\">Form data could not be decoded: {}</span>",
            escape(&err.to_string())
        ),
    };
    let _ = writeln!(html, "<p>{summary}</p>");

    for note in &form.notes {
        let _ = writeln!(html, "<p class=\"note\">{}</p>", escape(&note.to_string()));
    }

    if !form.fields.is_empty() {
        html.push_str(
            "<table border=\"1\">\n<tr><th>Field Name</th><th>Filename</th>\
             <th>Content Type</th><th>Value/Size</th></tr>\n",
        );
        for (name, value) in &form.fields {
            render_field(html, name, value, report.preview);
        }
        html.push_str("</table>\n");
    }
    html.push_str("</div>\n");
}

fn render_field(html: &mut String, name: &str, value: &FieldValue, config: &PreviewConfig) {
    match value {
        FieldValue::Text(text) => {
            let _ = writeln!(
                html,
                "<tr><td><strong>{}</strong></td><td>-</td><td>text/plain</td><td>{}</td></tr>",
                escape(name),
                escape(text),
            );
        }
        FieldValue::File(file) => {
            let _ = writeln!(
                html,
                "<tr><td><strong>{}</strong></td><td>{}</td><td>{}</td>\
                 <td>File size: {} bytes</td></tr>",
                escape(name),
                escape(&file.filename),
                escape(&file.media_type),
                file.content.len(),
            );
            if !file.content.is_empty() {
                let preview = preview::text(&file.content, config.file_chars);
                let _ = writeln!(
                    html,
                    "<tr><td colspan=\"4\"><strong>File preview:</strong>\
                     <pre>{}{}</pre></td></tr>",
                    escape(&preview.text),
                    if preview.truncated { "..." } else { "" },
                );
            }
        }
    }
}

fn render_query(html: &mut String, query: &FieldCollection) {
    if query.is_empty() {
        return;
    }
    html.push_str("<div class=\"section\">\n<h2>Query Parameters</h2>\n<ul>\n");
    for (name, value) in query {
        let _ = writeln!(
            html,
            "<li><strong>{}</strong>: {}</li>",
            escape(name),
            escape(value.as_text().unwrap_or_default()),
        );
    }
    html.push_str("</ul>\n</div>\n");
}

fn render_body(html: &mut String, body: &BodyBytes, config: &PreviewConfig) {
    html.push_str("<div class=\"section\">\n<h2>Request Body</h2>\n");

    match body.status() {
        ReadStatus::Complete => {}
        ReadStatus::Truncated { limit, .. } => {
            let _ = writeln!(
                html,
                "<p class=\"note\">Body exceeds {limit} bytes, only the first {limit} were read.</p>"
            );
        }
        ReadStatus::Failed {
            expected,
            received,
            reason,
        } => {
            let expected = expected
                .map(|expected| format!(" of {expected}"))
                .unwrap_or_default();
            let _ = writeln!(
                html,
                "<p class=\"error\">Error reading body after {received}{expected} bytes: {}</p>",
                escape(reason),
            );
        }
    }

    if body.is_empty() {
        html.push_str("<p>No request body received</p>\n</div>\n");
        return;
    }

    let shown = preview::escaped(body, config.body_bytes);
    let _ = writeln!(
        html,
        "<pre>Length: {} bytes\nContent: {}</pre>",
        body.len(),
        escape(&shown.text),
    );
    if shown.truncated {
        html.push_str("<p>... (truncated)</p>\n");
    }
    if std::str::from_utf8(body).is_err() {
        let _ = writeln!(
            html,
            "<pre>Hex dump (first {} bytes): {}</pre>",
            config.hex_bytes.min(body.len()),
            preview::hex_dump(body, config.hex_bytes),
        );
    }
    html.push_str("</div>\n");
}

fn render_env(html: &mut String, params: &Params<'_>) {
    html.push_str("<div class=\"section\">\n<h2>Environment Variables</h2>\n<pre>\n");
    for (name, value) in params.sorted() {
        let _ = writeln!(html, "{}={}", escape(name), escape(value));
    }
    html.push_str("</pre>\n</div>\n");
}

/// Escapes text for HTML element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            ch => escaped.push(ch),
        }
    }
    escaped
}
