use crate::models::WeekSnapshot;

pub fn render_index(snapshot: &WeekSnapshot) -> String {
    let initial = serde_json::to_string(snapshot)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/");
    INDEX_HTML
        .replace("{{RANGE}}", &snapshot.range_label)
        .replace("{{WEEK_TOTAL}}", &snapshot.week_total_label)
        .replace("{{REMAINING}}", &snapshot.remaining_label)
        .replace("{{INITIAL_STATE}}", &initial)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Epoch - Time Tracker</title>
  <style>
    :root {
      --bg: #f4f1ea;
      --ink: #26272b;
      --muted: #77736c;
      --accent: #2f6f5e;
      --accent-2: #c9573a;
      --card: #ffffff;
      --line: rgba(38, 39, 43, 0.1);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      padding: 28px 18px 48px;
    }

    header {
      display: flex;
      flex-wrap: wrap;
      align-items: center;
      justify-content: space-between;
      gap: 16px;
      margin-bottom: 24px;
    }

    h1 {
      margin: 0;
      font-size: 1.8rem;
    }

    .week-navigation {
      display: flex;
      align-items: center;
      gap: 12px;
    }

    .week-display {
      font-weight: 600;
      min-width: 220px;
      text-align: center;
    }

    button {
      appearance: none;
      border: 1px solid var(--line);
      background: var(--card);
      border-radius: 8px;
      padding: 8px 12px;
      font-size: 0.95rem;
      cursor: pointer;
    }

    .week-view {
      display: grid;
      grid-template-columns: repeat(7, minmax(140px, 1fr));
      gap: 12px;
      overflow-x: auto;
    }

    .week-view.weekdays-only {
      grid-template-columns: repeat(5, minmax(140px, 1fr));
    }

    .day-column {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 12px;
      padding: 12px;
      display: grid;
      gap: 10px;
      align-content: start;
    }

    .day-column.today {
      border-color: var(--accent);
      box-shadow: 0 0 0 2px rgba(47, 111, 94, 0.2);
    }

    .day-header h3 {
      margin: 0 0 4px;
      font-size: 1rem;
    }

    .day-total {
      color: var(--muted);
      font-size: 0.9rem;
    }

    .time-block {
      border-left: 4px solid var(--accent);
      background: rgba(47, 111, 94, 0.06);
      border-radius: 6px;
      padding: 8px;
      display: grid;
      gap: 4px;
    }

    .time-block.active {
      border-left-color: var(--accent-2);
      background: rgba(201, 87, 58, 0.08);
    }

    .time-block-header {
      display: flex;
      justify-content: space-between;
      gap: 6px;
      font-weight: 600;
    }

    .time-block-header button {
      padding: 0 6px;
      border: none;
      background: transparent;
    }

    .time-block-description,
    .time-block-duration {
      color: var(--muted);
      font-size: 0.85rem;
    }

    .clock-in-btn {
      background: var(--accent);
      color: white;
    }

    .clock-out-btn {
      background: var(--accent-2);
      color: white;
    }

    .week-summary {
      display: flex;
      gap: 24px;
      margin-top: 24px;
      font-size: 1.05rem;
    }

    .stat-label {
      color: var(--muted);
      margin-right: 6px;
    }

    .form-overlay {
      position: fixed;
      inset: 0;
      background: rgba(0, 0, 0, 0.35);
      display: grid;
      place-items: center;
    }

    .form-overlay[hidden] {
      display: none;
    }

    .form-modal {
      background: var(--card);
      border-radius: 12px;
      padding: 24px;
      width: min(360px, 92vw);
      display: grid;
      gap: 12px;
    }

    .form-modal h2 {
      margin: 0;
    }

    .form-group {
      display: grid;
      gap: 4px;
    }

    .form-actions {
      display: flex;
      justify-content: flex-end;
      gap: 8px;
    }
  </style>
</head>
<body>
  <header>
    <h1>Epoch - Time Tracker</h1>
    <div class="week-navigation">
      <button id="prev-week" type="button">&lt; Previous</button>
      <span class="week-display" id="week-display">{{RANGE}}</span>
      <button id="next-week" type="button">Next &gt;</button>
      <button id="this-week" type="button">Today</button>
    </div>
    <label class="weekend-toggle">
      <input id="weekend-toggle" type="checkbox" />
      <span>Show weekends (Saturday &amp; Sunday)</span>
    </label>
  </header>

  <main class="week-view" id="week-view"></main>

  <section class="week-summary">
    <div><span class="stat-label">Hours Worked:</span><span id="week-total">{{WEEK_TOTAL}}</span></div>
    <div><span class="stat-label">Remaining to 40h:</span><span id="remaining">{{REMAINING}}</span></div>
  </section>

  <div class="form-overlay" id="form-overlay" hidden>
    <form class="form-modal" id="block-form">
      <h2 id="form-title">Add Time Block</h2>
      <div class="form-group">
        <label for="start-time">Start Time:</label>
        <input type="time" id="start-time" required />
      </div>
      <div class="form-group">
        <label for="end-time">End Time:</label>
        <input type="time" id="end-time" required />
      </div>
      <div class="form-group">
        <label for="description">Description (optional):</label>
        <input type="text" id="description" placeholder="e.g., Meeting, Coding, Break" />
      </div>
      <div class="form-actions">
        <button type="button" id="cancel-form">Cancel</button>
        <button type="submit" id="submit-form">Add Time Block</button>
      </div>
    </form>
  </div>

  <script>
    let state = {{INITIAL_STATE}};
    let openForm = null;

    const weekView = document.getElementById('week-view');
    const overlay = document.getElementById('form-overlay');
    const form = document.getElementById('block-form');
    const startInput = document.getElementById('start-time');
    const endInput = document.getElementById('end-time');
    const descriptionInput = document.getElementById('description');
    const weekendToggle = document.getElementById('weekend-toggle');

    const send = async (method, path, body) => {
      const res = await fetch(path, {
        method,
        headers: body ? { 'content-type': 'application/json' } : {},
        body: body ? JSON.stringify(body) : undefined
      });
      if (!res.ok) {
        alert((await res.text()) || 'Request failed');
        return;
      }
      render(await res.json());
    };

    const el = (tag, className, text) => {
      const node = document.createElement(tag);
      if (className) node.className = className;
      if (text !== undefined) node.textContent = text;
      return node;
    };

    const renderBlock = (day, block) => {
      const card = el('div', block.isActive ? 'time-block active' : 'time-block');
      const header = el('div', 'time-block-header');
      header.appendChild(el('span', 'time-range', `${block.startTime} - ${block.endTime || '...'}`));
      const actions = el('span');
      if (!block.isActive) {
        const edit = el('button', 'edit-btn', '✎');
        edit.title = 'Edit time block';
        edit.onclick = () => send('POST', `/api/days/${day.index}/blocks/${block.id}/edit`);
        actions.appendChild(edit);
      }
      const remove = el('button', 'remove-btn', '×');
      remove.title = 'Remove time block';
      remove.onclick = () => send('DELETE', `/api/days/${day.index}/blocks/${block.id}`);
      actions.appendChild(remove);
      header.appendChild(actions);
      card.appendChild(header);
      card.appendChild(el('div', 'time-block-duration', block.durationLabel || 'In progress'));
      if (block.description) {
        card.appendChild(el('div', 'time-block-description', block.description));
      }
      return card;
    };

    const renderDay = (day) => {
      const column = el('section', day.isToday ? 'day-column today' : 'day-column');
      const header = el('div', 'day-header');
      header.appendChild(el('h3', '', day.label));
      header.appendChild(el('div', 'day-total', `Total: ${day.totalLabel}`));
      column.appendChild(header);

      if (day.showClock) {
        const clockedIn = state.clock.isClockedIn;
        const toggle = el('button', clockedIn ? 'clock-out-btn' : 'clock-in-btn', clockedIn ? 'Clock Out' : 'Clock In');
        toggle.onclick = () => send('POST', clockedIn ? '/api/clock/out' : '/api/clock/in');
        column.appendChild(toggle);
      }

      const blocks = el('div', 'time-blocks');
      day.blocks.forEach((block) => blocks.appendChild(renderBlock(day, block)));
      column.appendChild(blocks);

      if (day.canAdd) {
        const add = el('button', 'add-block-btn', '+ Add Time Block');
        add.onclick = () => send('POST', `/api/days/${day.index}/form`);
        column.appendChild(add);
      }
      return column;
    };

    const renderForm = () => {
      const mode = state.form.mode;
      if (mode === 'closed') {
        overlay.hidden = true;
        openForm = null;
        return;
      }
      const key = `${mode}:${state.form.day}:${state.form.blockId || ''}`;
      if (openForm !== key) {
        startInput.value = state.form.startTime;
        endInput.value = state.form.endTime;
        descriptionInput.value = state.form.description || '';
        openForm = key;
      }
      const editing = mode === 'editing';
      document.getElementById('form-title').textContent = editing ? 'Edit Time Block' : 'Add Time Block';
      document.getElementById('submit-form').textContent = editing ? 'Save Changes' : 'Add Time Block';
      overlay.hidden = false;
    };

    const render = (next) => {
      if (!next) return;
      state = next;
      document.getElementById('week-display').textContent = state.rangeLabel;
      document.getElementById('week-total').textContent = state.weekTotalLabel;
      document.getElementById('remaining').textContent = state.remainingLabel;
      weekendToggle.checked = state.showWeekends;
      weekView.classList.toggle('weekdays-only', !state.showWeekends);
      weekView.replaceChildren(...state.days.map(renderDay));
      renderForm();
    };

    document.getElementById('prev-week').onclick = () => send('POST', '/api/week/previous');
    document.getElementById('next-week').onclick = () => send('POST', '/api/week/next');
    document.getElementById('this-week').onclick = () => send('POST', '/api/week/today');
    weekendToggle.onchange = () => send('POST', '/api/weekends', { show: weekendToggle.checked });
    document.getElementById('cancel-form').onclick = () => send('DELETE', '/api/form');

    form.addEventListener('submit', (event) => {
      event.preventDefault();
      if (!startInput.value || !endInput.value) {
        alert('Please enter both start and end times');
        return;
      }
      send('POST', '/api/form', {
        startTime: startInput.value,
        endTime: endInput.value,
        description: descriptionInput.value
      });
    });

    const events = new EventSource('/api/events');
    events.addEventListener('week', (event) => render(JSON.parse(event.data)));

    render(state);
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClockState, FormSnapshot};

    #[test]
    fn index_embeds_snapshot_without_closing_script() {
        let snapshot = WeekSnapshot {
            week_key: "2026-10-12".to_string(),
            range_label: "Mon, Oct 12 - Sun, Oct 18".to_string(),
            show_weekends: true,
            days: Vec::new(),
            week_total_minutes: 90,
            week_total_label: "1h 30m".to_string(),
            remaining_minutes: 2310,
            remaining_label: "38h 30m".to_string(),
            clock: ClockState::default(),
            form: FormSnapshot::Closed,
        };
        let mut hostile = snapshot.clone();
        hostile.week_key = "</script><b>".to_string();

        let html = render_index(&snapshot);
        assert!(html.contains("Mon, Oct 12 - Sun, Oct 18"));
        assert!(html.contains(r#""weekKey":"2026-10-12""#));
        assert!(html.contains("38h 30m"));
        assert!(!html.contains("{{"));

        let html = render_index(&hostile);
        assert!(!html.contains("</script><b>"));
    }
}
