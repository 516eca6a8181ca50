use std::io::{self, Write};

use repoai_console::backends;
use repoai_console::config::ConsoleConfig;
use repoai_console::confirm::StdinConfirmation;
use repoai_console::logging::init_logging;
use repoai_console::{Console, Flow};
use tracing::info;

fn main() -> io::Result<()> {
    init_logging();

    let config = ConsoleConfig::from_env().map_err(io::Error::other)?;
    let backend = backends::backend_from_env(&config).map_err(io::Error::other)?;
    info!(
        backend = backend.backend_id(),
        base_url = %config.base_url,
        workspace = %config.workspace,
        "console starting"
    );

    let mut console = Console::new(backend, config.workspace.clone(), io::stdout());
    let mut confirm = StdinConfirmation;
    console.banner()?;

    loop {
        let mut stdout = io::stdout();
        write!(stdout, "{}", console.prompt())?;
        stdout.flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        if console.handle_line(&line, &mut confirm)? == Flow::Quit {
            break;
        }
    }

    Ok(())
}
