use std::time::Duration;

use crate::download::layout::THUMBNAIL_SUFFIX;

const SIGNED_OUT: &str = r#"<p>You are not signed in.</p>
<p><a class="button" href="/auth">Sign in with Google</a></p>"#;

const SIGNED_IN: &str = r#"<p>Signed in.</p>
<p><button id="pick">Pick photos</button> <button id="download" disabled>Download selection</button></p>
<p id="status"></p>
<div id="items"></div>
<script>
const THUMBNAIL_SUFFIX = "{{THUMBNAIL_SUFFIX}}";
const POLL_INTERVAL_MS = {{POLL_INTERVAL_MS}};
let sessionId = null;

function status(text) {
  document.getElementById("status").textContent = text;
}

async function call(method, path) {
  const res = await fetch(path, { method });
  const body = await res.json();
  if (!res.ok) throw new Error(body.error || res.statusText);
  return body;
}

function render(items) {
  const container = document.getElementById("items");
  container.replaceChildren();
  for (const item of items) {
    const img = document.createElement("img");
    img.src = "/proxy?url=" + encodeURIComponent(item.mediaFile.baseUrl + THUMBNAIL_SUFFIX);
    img.alt = item.mediaFile.filename || item.id;
    img.title = img.alt;
    container.appendChild(img);
  }
}

async function poll() {
  for (;;) {
    try {
      const session = await call("GET", "/session/" + encodeURIComponent(sessionId));
      if (session.mediaItems && session.mediaItems.length > 0) {
        render(session.mediaItems);
        status(session.mediaItems.length + " item(s) selected.");
        document.getElementById("download").disabled = false;
        return;
      }
    } catch (err) {
      console.warn("session poll failed:", err.message);
    }
    await new Promise((resolve) => setTimeout(resolve, POLL_INTERVAL_MS));
  }
}

document.getElementById("pick").addEventListener("click", async () => {
  try {
    const session = await call("POST", "/picker");
    sessionId = session.id;
    window.open(session.pickerUri, "_blank");
    status("Waiting for your selection...");
    await poll();
  } catch (err) {
    status("Error: " + err.message);
  }
});

document.getElementById("download").addEventListener("click", async () => {
  try {
    status("Downloading...");
    const summary = await call("POST", "/download?session=" + encodeURIComponent(sessionId));
    status("Downloaded " + summary.downloaded + " of " + summary.total + " into " + summary.directory);
  } catch (err) {
    status("Error: " + err.message);
  }
});
</script>"#;

/// Home page; the body depends on whether a usable token is held.
///
/// The signed-in page polls the session every `poll_interval`.
pub fn render(authenticated: bool, poll_interval: Duration) -> String {
    let body = if authenticated {
        SIGNED_IN
            .replace("{{THUMBNAIL_SUFFIX}}", THUMBNAIL_SUFFIX)
            .replace("{{POLL_INTERVAL_MS}}", &poll_interval.as_millis().to_string())
    } else {
        SIGNED_OUT.to_string()
    };
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>photopick</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
#items img {{ width: 150px; height: 150px; margin: 4px; object-fit: cover; }}
</style>
</head>
<body>
<h1>photopick</h1>
{body}
</body>
</html>"#
    )
}
