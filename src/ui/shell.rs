//! The interactive shell: terminal lifecycle plus the single event loop.
//!
//! All state transitions happen on this loop. The asynchronous boundaries
//! (identity load, contact fetch, connection handshake) run as tasks that
//! report back over one channel; the contact fetch is cancelled on teardown
//! so it never updates a torn-down shell.

use crate::api::fetch_contacts;
use crate::auth::{AuthGuard, Navigation};
use crate::core::app::{App, FrameHits};
use crate::core::config::Config;
use crate::core::identity::UserIdentity;
use crate::core::presence::{PresenceConnector, PresenceManager, WsConnector};
use crate::core::session::SessionStore;
use crate::ui::render;
use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::layout::Position;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::warn;

type ShellTerminal = Terminal<CrosstermBackend<io::Stdout>>;

enum ShellEvent {
    IdentityLoaded(Option<UserIdentity>),
    ContactsLoaded(Vec<UserIdentity>),
}

fn setup_terminal() -> Result<ShellTerminal, Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout)).inspect_err(|_| {
        let _ = disable_raw_mode();
    })?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut ShellTerminal) -> Result<(), Box<dyn std::error::Error>> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the shell until exit or a navigation side effect.
pub async fn run_shell(
    config: &Config,
    store: Arc<dyn SessionStore>,
) -> Result<Option<Navigation>, Box<dyn std::error::Error>> {
    let connector: Arc<dyn PresenceConnector> = Arc::new(WsConnector);
    let mut terminal = setup_terminal()?;
    let result = run_event_loop(&mut terminal, config, store, connector).await;
    restore_terminal(&mut terminal)?;
    result
}

async fn run_event_loop(
    terminal: &mut ShellTerminal,
    config: &Config,
    store: Arc<dyn SessionStore>,
    connector: Arc<dyn PresenceConnector>,
) -> Result<Option<Navigation>, Box<dyn std::error::Error>> {
    let size = terminal.size()?;
    let mut app = App::new(size.width, config.wide_min_width());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ShellEvent>();
    let teardown = CancellationToken::new();

    let presence = PresenceManager::new(connector, config.presence_url().to_string());
    let presence_status = presence.status_watch();
    let presence = Arc::new(Mutex::new(presence));

    // Identity load is the first asynchronous boundary; the splash frame
    // renders until it resolves.
    {
        let store = store.clone();
        let event_tx = event_tx.clone();
        tokio::spawn(async move {
            let guard = AuthGuard::new(&*store);
            let identity = guard.load_identity().unwrap_or_else(|err| {
                warn!("Failed to read session: {err}");
                None
            });
            let _ = event_tx.send(ShellEvent::IdentityLoaded(identity));
        });
    }

    let client = reqwest::Client::new();
    let mut last_hits = FrameHits::default();
    let navigation = loop {
        app.presence = *presence_status.borrow();

        terminal.draw(|frame| {
            last_hits = render::draw(frame, &app);
        })?;

        while let Ok(shell_event) = event_rx.try_recv() {
            match shell_event {
                ShellEvent::IdentityLoaded(identity) => {
                    app.identity_loaded(identity);
                    if let Some(identity) = app.identity.clone() {
                        spawn_contact_fetch(
                            &client,
                            config.api_base_url(),
                            &identity.id,
                            event_tx.clone(),
                            teardown.clone(),
                        );
                        spawn_presence_activation(
                            presence.clone(),
                            identity,
                            teardown.clone(),
                        );
                    }
                }
                ShellEvent::ContactsLoaded(contacts) => app.contacts_loaded(contacts),
            }
        }

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.logout_confirm_open {
                        match key.code {
                            KeyCode::Enter | KeyCode::Char('y') => app.confirm_logout(),
                            KeyCode::Esc | KeyCode::Char('n') => app.cancel_logout(),
                            _ => {}
                        }
                    } else {
                        match key.code {
                            KeyCode::Char('q') => app.request_exit(),
                            KeyCode::Char('c')
                                if key.modifiers.contains(KeyModifiers::CONTROL) =>
                            {
                                app.request_exit()
                            }
                            _ => {}
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    if mouse.kind == MouseEventKind::Down(MouseButton::Left) {
                        app.handle_pointer_down(
                            Position::new(mouse.column, mouse.row),
                            &last_hits,
                        );
                    }
                }
                Event::Resize(columns, _rows) => app.handle_resize(columns),
                _ => {}
            }
        }

        if let Some(navigation) = app.navigate {
            if navigation == Navigation::Root {
                // Logout confirmed: the slot is cleared before we navigate.
                let guard = AuthGuard::new(&*store);
                guard.logout()?;
            }
            break Some(navigation);
        }
        if app.exit_requested {
            break None;
        }
    };

    // Connection lifetime is tied to the shell: never leak a live socket.
    teardown.cancel();
    presence.lock().await.shutdown().await;

    Ok(navigation)
}

fn spawn_contact_fetch(
    client: &reqwest::Client,
    base_url: &str,
    user_id: &str,
    event_tx: mpsc::UnboundedSender<ShellEvent>,
    teardown: CancellationToken,
) {
    let client = client.clone();
    let base_url = base_url.to_string();
    let user_id = user_id.to_string();
    tokio::spawn(async move {
        tokio::select! {
            _ = teardown.cancelled() => {}
            result = fetch_contacts(&client, &base_url, &user_id) => match result {
                Ok(contacts) => {
                    let _ = event_tx.send(ShellEvent::ContactsLoaded(contacts));
                }
                // Recovered locally: the list stays empty, the UI stays up.
                Err(err) => warn!("Error fetching contacts: {err}"),
            }
        }
    });
}

fn spawn_presence_activation(
    presence: Arc<Mutex<PresenceManager>>,
    identity: UserIdentity,
    teardown: CancellationToken,
) {
    tokio::spawn(async move {
        let mut manager = presence.lock().await;
        // Race the handshake (and its backoff sleeps) against teardown so
        // quitting never stalls behind an unreachable backend: cancelling
        // drops the attempt and releases the lock for shutdown.
        tokio::select! {
            _ = teardown.cancelled() => {}
            result = manager.ensure_connected(&identity) => {
                if let Err(err) = result {
                    warn!("Presence connection unavailable: {err}");
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::presence::{PresenceError, PresenceLink};
    use crate::utils::test_utils::create_test_identity;
    use async_trait::async_trait;

    struct HangingConnector;

    #[async_trait]
    impl PresenceConnector for HangingConnector {
        async fn connect(&self, _url: &str) -> Result<Box<dyn PresenceLink>, PresenceError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn teardown_is_not_blocked_by_an_inflight_connect() {
        let manager = PresenceManager::new(
            Arc::new(HangingConnector),
            "wss://test.invalid".to_string(),
        );
        let presence = Arc::new(Mutex::new(manager));
        let teardown = CancellationToken::new();

        spawn_presence_activation(
            presence.clone(),
            create_test_identity("u1", "alice"),
            teardown.clone(),
        );
        // Let the activation task grab the lock and park in the handshake.
        tokio::time::sleep(Duration::from_millis(10)).await;

        teardown.cancel();
        let acquired =
            tokio::time::timeout(Duration::from_millis(500), presence.lock()).await;
        let mut manager = acquired.expect("teardown must acquire the presence lock promptly");
        manager.shutdown().await;
    }
}
