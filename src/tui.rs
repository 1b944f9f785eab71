use std::time::Duration;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use crate::app::App;
use crate::ui;

pub fn run(mut app: App) -> anyhow::Result<()> {
    // 1. Setup Terminal
    let mut terminal = ratatui::init();
    app.start();

    let result = event_loop(&mut terminal, &mut app);

    // 3. Restore Terminal
    ratatui::restore();
    result
}

// 2. The Game Loop
fn event_loop(terminal: &mut DefaultTerminal, app: &mut App) -> anyhow::Result<()> {
    loop {
        app.drain_updates();
        if app.needs_redraw() {
            terminal.draw(|f| ui::render(f, app))?;
        }

        // Input polling blocks this worker; fetches run on the others.
        if tokio::task::block_in_place(|| event::poll(Duration::from_millis(100)))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Event::Resize(..) => app.mark_dirty(),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
