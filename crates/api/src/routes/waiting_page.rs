//! Built-in waiting page.

use axum::{
    http::{header, HeaderValue},
    response::{Html, IntoResponse, Response},
};

/// Polls the status endpoint and returns to the site once admitted.
const WAITING_PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>You are in line</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 32rem; margin: 4rem auto; padding: 0 1rem; color: #222; }
  #position { font-size: 3rem; font-weight: 600; margin: 1rem 0; }
  .muted { color: #666; }
</style>
</head>
<body>
<h1>The site is busy</h1>
<p>You are in line and will be let in automatically. Keep this page open.</p>
<div id="position">&hellip;</div>
<p class="muted" id="detail">Checking your place in line</p>
<script>
(function () {
  var positionEl = document.getElementById("position");
  var detailEl = document.getElementById("detail");
  var defaultDelay = 5;

  function schedule(secs) {
    setTimeout(poll, Math.max(1, secs || defaultDelay) * 1000);
  }

  function poll() {
    fetch("/waiting_room/status", { credentials: "same-origin", cache: "no-store" })
      .then(function (res) {
        if (!res.ok) {
          detailEl.textContent = "Temporarily unavailable, retrying";
          schedule(Number(res.headers.get("Retry-After")));
          return null;
        }
        return res.json();
      })
      .then(function (body) {
        if (!body) return;
        if (body.state !== "queued") {
          positionEl.textContent = "Your turn";
          detailEl.textContent = "Redirecting";
          window.location.replace("/");
          return;
        }
        positionEl.textContent = "#" + (body.position + 1);
        detailEl.textContent = body.position === 0 ? "You are next" : body.position + " ahead of you";
        schedule(body.retry_after_secs);
      })
      .catch(function () {
        detailEl.textContent = "Connection lost, retrying";
        schedule(defaultDelay);
      });
  }

  poll();
})();
</script>
</body>
</html>
"##;

/// GET /waiting_room.html (or the configured waiting page path)
pub async fn waiting_page_handler() -> Response {
    let mut response = Html(WAITING_PAGE).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
