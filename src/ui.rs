use crate::models::{DealsByDate, GridCell, GridDescription};
use std::fmt::Write;

pub fn render_index(grid: &GridDescription, deals_by_date: &DealsByDate, date_field_id: u64) -> String {
    let total: usize = deals_by_date.values().map(Vec::len).sum();
    INDEX_HTML
        .replace("{{LABEL}}", &escape(&grid.label))
        .replace("{{WEEKDAYS}}", &render_weekdays(grid))
        .replace("{{CELLS}}", &render_cells(grid, deals_by_date))
        .replace("{{TOTAL}}", &total.to_string())
        .replace("{{FIELD_ID}}", &date_field_id.to_string())
}

pub fn render_error(message: &str) -> String {
    ERROR_HTML.replace("{{MESSAGE}}", &escape(message))
}

fn render_weekdays(grid: &GridDescription) -> String {
    grid.weekdays.iter().fold(String::new(), |mut out, name| {
        let _ = write!(out, r#"<div class="weekday">{name}</div>"#);
        out
    })
}

fn render_cells(grid: &GridDescription, deals_by_date: &DealsByDate) -> String {
    let mut out = String::new();
    for cell in &grid.cells {
        match cell {
            GridCell::Blank => out.push_str(r#"<div class="cell blank"></div>"#),
            GridCell::Day {
                day,
                date,
                is_today,
                deal_count,
            } => {
                let mut classes = String::from("cell day");
                if *is_today {
                    classes.push_str(" today");
                }
                if *deal_count > 0 {
                    classes.push_str(" has-deals");
                }

                let names = deals_by_date
                    .get(date)
                    .map(|deals| {
                        deals
                            .iter()
                            .map(|deal| escape(&deal.name))
                            .collect::<Vec<_>>()
                            .join("&#10;")
                    })
                    .unwrap_or_default();

                let _ = write!(
                    out,
                    r#"<button type="button" class="{classes}" data-date="{date}" title="{names}"><span class="num">{day}</span>"#
                );
                if *deal_count > 0 {
                    let _ = write!(out, r#"<span class="badge">{deal_count}</span>"#);
                }
                out.push_str("</button>");
            }
        }
    }
    out
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
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

const ERROR_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <title>Deal Calendar</title>
</head>
<body>
  <main class="app error">
    <h1>Calendar unavailable</h1>
    <p class="status" data-type="error">{{MESSAGE}}</p>
    <form method="post" action="/calendar/today"><button type="submit">Back to today</button></form>
  </main>
</body>
</html>
"#;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Deal Calendar</title>
  <style>
    :root {
      --bg: #f4f6f9;
      --ink: #27313b;
      --muted: #7b8794;
      --accent: #2f80ed;
      --accent-soft: rgba(47, 128, 237, 0.12);
      --card: #ffffff;
      --shadow: 0 18px 40px rgba(39, 49, 59, 0.12);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "PT Sans", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: start center;
      padding: 28px 16px 40px;
    }

    .app {
      width: min(760px, 100%);
      background: var(--card);
      border-radius: 20px;
      box-shadow: var(--shadow);
      padding: 28px;
      display: grid;
      gap: 20px;
    }

    header {
      display: flex;
      align-items: center;
      justify-content: space-between;
      gap: 12px;
    }

    h1 {
      margin: 0;
      font-size: 1.6rem;
    }

    .nav {
      display: flex;
      gap: 8px;
    }

    .nav button {
      appearance: none;
      border: 1px solid rgba(39, 49, 59, 0.12);
      background: white;
      border-radius: 999px;
      padding: 8px 14px;
      font-weight: 600;
      cursor: pointer;
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(7, 1fr);
      gap: 6px;
    }

    .weekday {
      text-align: center;
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: var(--muted);
      padding-bottom: 4px;
    }

    .cell {
      min-height: 64px;
      border-radius: 12px;
    }

    .cell.day {
      appearance: none;
      border: 1px solid rgba(39, 49, 59, 0.08);
      background: white;
      display: flex;
      flex-direction: column;
      align-items: flex-start;
      justify-content: space-between;
      padding: 8px;
      cursor: pointer;
      font: inherit;
      color: inherit;
    }

    .cell.today {
      border-color: var(--accent);
      box-shadow: inset 0 0 0 1px var(--accent);
    }

    .cell.has-deals {
      background: var(--accent-soft);
    }

    .badge {
      align-self: flex-end;
      background: var(--accent);
      color: white;
      border-radius: 999px;
      padding: 2px 8px;
      font-size: 0.8rem;
      font-weight: 600;
    }

    .deals {
      min-height: 1.2em;
      color: var(--muted);
    }

    .deals ul {
      margin: 6px 0 0;
      padding-left: 18px;
      color: var(--ink);
    }

    .settings {
      display: flex;
      flex-wrap: wrap;
      align-items: center;
      gap: 10px;
      font-size: 0.9rem;
      color: var(--muted);
    }

    .settings input {
      width: 140px;
      padding: 6px 10px;
      border-radius: 8px;
      border: 1px solid rgba(39, 49, 59, 0.2);
    }

    @media (max-width: 600px) {
      .app {
        padding: 18px 12px;
      }
      .cell {
        min-height: 48px;
      }
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1 id="label">{{LABEL}}</h1>
      <div class="nav">
        <form method="post" action="/calendar/prev"><button type="submit">&larr;</button></form>
        <form method="post" action="/calendar/today"><button type="submit">Today</button></form>
        <form method="post" action="/calendar/next"><button type="submit">&rarr;</button></form>
      </div>
    </header>

    <section class="grid">
      {{WEEKDAYS}}
      {{CELLS}}
    </section>

    <section class="deals" id="deals">{{TOTAL}} deals this month. Pick a day to list them.</section>

    <form class="settings" method="post" action="/settings">
      <label for="field">Order date field</label>
      <input id="field" name="dealDateFieldId" type="number" min="1" value="{{FIELD_ID}}" />
      <button type="submit">Save</button>
    </form>
  </main>

  <script>
    const dealsEl = document.getElementById('deals');

    const escapeText = (text) => {
      const span = document.createElement('span');
      span.textContent = text;
      return span.innerHTML;
    };

    const showDeals = async (date) => {
      const res = await fetch('/api/deals?date=' + encodeURIComponent(date));
      if (!res.ok) {
        throw new Error(await res.text());
      }
      const data = await res.json();
      if (!data.deals.length) {
        dealsEl.textContent = 'No deals on ' + data.date + '.';
        return;
      }
      const items = data.deals
        .map((deal) => '<li>' + escapeText(deal.name) + ' (' + deal.price + ')</li>')
        .join('');
      dealsEl.innerHTML = escapeText(data.date) + '<ul>' + items + '</ul>';
    };

    document.querySelectorAll('.cell.day').forEach((cell) => {
      cell.addEventListener('click', () => {
        showDeals(cell.dataset.date).catch((err) => {
          dealsEl.textContent = err.message;
        });
      });
    });
  </script>
</body>
</html>
"#;
