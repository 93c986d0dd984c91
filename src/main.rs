use std::io::{self, Write};
use std::time::Instant;

use anyhow::Result;
use tracing::error;

use manga_reader::utils::{Command, HELP, display_elapsed_time, parse_command, render_screen};
use manga_reader::{ChapterImageExtractor, Config, Controller, Library, get_user_input, logger};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logger::init();

    let config = Config::load()?;
    let library = Library::load(&config.library.path).await?;
    let extractor = ChapterImageExtractor::from_config(&config)?;
    let mut controller = Controller::new(library, extractor);

    println!("\n=== manga-reader ===");
    println!("{}", HELP);
    print!("{}", render_screen(&controller.render()));

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = get_user_input()? else {
            break;
        };

        match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(Command::Help) => println!("{}", HELP),
            Ok(Command::List) => {}
            Ok(Command::Action(action)) => {
                let timed = action.fetches();
                let start = Instant::now();
                if let Err(e) = controller.dispatch(action).await {
                    error!("{:#}", e);
                }
                if timed {
                    display_elapsed_time(start.elapsed());
                }
            }
            Err(e) => {
                println!("{}", e);
                continue;
            }
        }

        print!("{}", render_screen(&controller.render()));
    }

    println!("Bye.");
    Ok(())
}
