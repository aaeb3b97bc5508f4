//! Inline HTML for the dispatch board.

use crate::db_types::ActiveCall;

/// HTML-escape a string to prevent XSS.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Card for a single active call. Also the fragment returned by form submission.
pub fn active_call_card(call: &ActiveCall) -> String {
    format!(
        r##"
    <div class="card mb-3" id="active-call-{id}">
        <div class="card-header">
          Anointing Call
        </div>
        <div class="card-body">
          <h5 class="card-title">{patient_name}</h5>
          <p class="card-text">Address: {address}</p>
          <a href="#" class="btn btn-primary">Accept Call</a>
          <a href="#" class="btn btn-secondary">Reject Call</a>
        </div>
    </div>
    "##,
        id = call.id,
        patient_name = html_escape(&call.patient_name),
        address = html_escape(&call.address),
    )
}

/// Dispatch board: submission form followed by every active call.
pub fn index_page(calls: &[ActiveCall]) -> String {
    let cards: String = calls.iter().map(active_call_card).collect();

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0, viewport-fit=cover">
<title>On-Call Ministry</title>
<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/css/bootstrap.min.css">
<script src="https://unpkg.com/htmx.org@1.9.10"></script>
<style>
:root {{ --sat: env(safe-area-inset-top); }}
#pull-to-refresh-indicator {{ position: fixed; top: 0; left: 0; right: 0; text-align: center; transform: translateY(-100%); transition: transform 0.2s; }}
#refresh-spinner {{ display: none; }}
</style>
</head>
<body>
<div id="pull-to-refresh-indicator">
  <span id="pull-message">Pull to refresh</span>
  <span id="refresh-spinner" class="spinner-border spinner-border-sm" role="status"></span>
</div>
<div class="container py-4">
  <h1 class="h3 mb-4">Active Calls</h1>
  <form class="mb-4" hx-post="/submit-active-call" hx-target="#active-calls" hx-swap="afterbegin" hx-on::after-request="this.reset()">
    <div class="mb-2"><input class="form-control" type="text" name="patientName" placeholder="Patient name" required></div>
    <div class="mb-2"><input class="form-control" type="text" name="address" placeholder="Address" required></div>
    <div class="mb-2"><textarea class="form-control" name="notes" placeholder="Notes"></textarea></div>
    <button type="submit" class="btn btn-primary">Submit Call</button>
  </form>
  <div id="active-calls">{cards}</div>
</div>
<script src="/static/pull-to-refresh.js"></script>
</body>
</html>"##,
    )
}
