use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;

use edgechat::ai::stt::SttError;
use edgechat::{AppConfig, ChatDriver, LoadOutcome};

const HELP: &str = "\
Commands:
  :image <path>   describe an image
  :voice <path>   transcribe a WAV recording and send it
  :save <path>    save the transcript to a file
  :load <path>    switch to a different chat log
  :history        show the full transcript
  :quit           exit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("edgechat");
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    let mut config = AppConfig::load(&data_dir);
    if let Some(path) = std::env::args().nth(1) {
        config.log_file = PathBuf::from(path);
    }
    log::info!("Chat log: {}", config.log_file.display());

    let mut driver = ChatDriver::new(config).map_err(anyhow::Error::msg)?;

    if !driver.history().is_empty() {
        println!("{}", driver.history().render_text());
    }
    println!("{}", HELP);

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // All driver errors are reported here and never crash the loop.
        match line.split_once(' ') {
            Some((":image", path)) => handle_image(&mut driver, path.trim()).await,
            Some((":voice", path)) => handle_voice(&mut driver, path.trim()).await,
            Some((":save", path)) => match driver.save_transcript_as(Path::new(path.trim())) {
                Ok(()) => println!("Saved transcript to {}", path.trim()),
                Err(e) => println!("{}", e),
            },
            Some((":load", path)) => match driver.switch_log(Path::new(path.trim())) {
                Ok(LoadOutcome::Loaded(n)) => println!("Loaded {} turns", n),
                Ok(LoadOutcome::NotFound) => println!("Started a new log at {}", path.trim()),
                Err(e) => println!("{}", e),
            },
            _ if line == ":history" => println!("{}", driver.history().render_text()),
            _ if line == ":quit" => break,
            _ if line.starts_with(':') => println!("{}", HELP),
            _ => respond(&mut driver, line).await,
        }
    }

    Ok(())
}

async fn respond(driver: &mut ChatDriver, text: &str) {
    match driver.generate_response(text).await {
        Ok(reply) => println!("Assistant: {}", reply),
        Err(e) => println!("{}", e),
    }
}

async fn handle_image(driver: &mut ChatDriver, path: &str) {
    match driver.save_image(Path::new(path)).await {
        Ok(Some(saved)) => {
            println!("![Image]({})", saved.path.display());
            println!("Assistant: {}", saved.caption);
        }
        Ok(None) => println!("No such image: {}", path),
        Err(e) => println!("{}", e),
    }
}

async fn handle_voice(driver: &mut ChatDriver, path: &str) {
    let audio = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            println!("Could not read {}: {}", path, e);
            return;
        }
    };

    println!("Listening...");
    match driver.transcribe(audio).await {
        Ok(text) => {
            println!("You (speech): {}", text);
            respond(driver, &text).await;
        }
        // Each failure mode gets its own user-facing message; none retry.
        Err(e @ SttError::NoSpeech) => println!("{}", e),
        Err(e @ SttError::Request(_)) => println!("{}", e),
        Err(e @ SttError::Other(_)) => println!("{}", e),
    }
}
