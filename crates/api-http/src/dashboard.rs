// Dashboard page

/// Minimal HTML page embedding the accepted-event count
pub fn render_dashboard(events_accepted: u64, queue_depth: usize, queue_closed: bool) -> String {
    let queue_state = if queue_closed { "closed" } else { "open" };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta http-equiv="refresh" content="5">
  <title>Dispatch</title>
  <style>
    body {{ font-family: sans-serif; margin: 3rem; color: #222; }}
    .counter {{ font-size: 4rem; font-weight: bold; }}
    .meta {{ color: #666; }}
  </style>
</head>
<body>
  <h1>Dispatch</h1>
  <p>Events accepted</p>
  <p class="counter" id="events-accepted">{events_accepted}</p>
  <p class="meta">Queue depth: {queue_depth} ({queue_state})</p>
  <p class="meta"><a href="/metrics">Prometheus metrics</a></p>
</body>
</html>
"#
    )
}
