mod audio;
mod draw;
mod game;
mod pixels;
mod store;

use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, MouseButton,
        MouseEventKind,
    },
    execute, terminal,
};
use std::io::{self, stdout};
use std::time::{Duration, Instant};

use audio::{AudioEngine, AudioOutput, NullAudio};
use game::{Game, Mode};
use pixels::Surface;
use store::FileStore;

fn main() -> io::Result<()> {
    let mut out = stdout();
    terminal::enable_raw_mode()?;
    execute!(
        out,
        terminal::EnterAlternateScreen,
        cursor::Hide,
        terminal::DisableLineWrap,
        EnableMouseCapture,
    )?;

    let result = run(&mut out);

    execute!(
        out,
        DisableMouseCapture,
        terminal::LeaveAlternateScreen,
        cursor::Show,
        terminal::EnableLineWrap,
    )?;
    terminal::disable_raw_mode()?;
    result
}

fn run(out: &mut io::Stdout) -> io::Result<()> {
    let (cols, rows) = terminal::size()?;
    let pw = cols as usize;
    let ph = rows as usize * 2;

    // No output device means a silent game, not a dead one.
    let audio: Box<dyn AudioOutput> = match AudioEngine::new() {
        Ok(engine) => Box::new(engine),
        Err(_) => Box::new(NullAudio),
    };

    let mut game = Game::new(pw, ph, audio, Box::new(FileStore::new()));
    let mut fb = Surface::new(pw, ph, draw::SKY_TOP);

    let frame_dur = Duration::from_millis(33); // ~30 fps
    let mut last = Instant::now();

    loop {
        let frame_start = Instant::now();

        // Input
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Enter => game.start(),
                    KeyCode::Char(' ') | KeyCode::Up => game.jump(),
                    _ => {}
                },
                Event::Mouse(m) => {
                    if let MouseEventKind::Down(MouseButton::Left) = m.kind {
                        let x = m.column as f64;
                        let y = m.row as f64 * 2.0;
                        match game.mode() {
                            Mode::Idle if game.start_button().contains(x, y) => game.start(),
                            Mode::Active => game.jump(),
                            _ => {}
                        }
                    }
                }
                Event::Resize(c, r) => {
                    let npw = c as usize;
                    let nph = r as usize * 2;
                    fb.resize(npw, nph, draw::SKY_TOP);
                    game.resize(npw, nph);
                }
                _ => {}
            }
        }

        // Update
        let dt_ms = last.elapsed().as_secs_f64() * 1000.0;
        last = Instant::now();
        game.advance(dt_ms);

        // Render
        game.render(&mut fb);
        fb.present(out)?;

        // Frame pacing
        let elapsed = frame_start.elapsed();
        if elapsed < frame_dur {
            std::thread::sleep(frame_dur - elapsed);
        }
    }
}
