/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `chat`: Interactive conversation loop
- `ask`: One prompt, one reply
- `sessions`: List saved sessions
- `engines`: List the engine catalog

The handlers wire the library components together: context loading,
history building, provider dispatch, and session storage.
*/

use crate::cli::MaterialArgs;
use crate::config::Config;
use crate::context::{load_material, ContextMaterial};
use crate::error::{RagbotError, Result};
use crate::history::HistoryBuilder;
use crate::output::extract_structured_output;
use crate::providers::Dispatcher;
use crate::session::SessionStore;

// Engine catalog listing
pub mod engines;

/// Instruction and dataset material for a new conversation
#[derive(Debug, Default)]
pub struct Material {
    /// Instruction blocks
    pub instructions: ContextMaterial,
    /// Curated dataset blocks
    pub datasets: ContextMaterial,
}

/// Resolve and load the material a new conversation starts with
///
/// Catalog default paths come first, then profile paths, then explicit
/// paths. `--no-instructions` skips all of it.
///
/// # Errors
///
/// Returns `RagbotError::Config` for an unknown profile and
/// `RagbotError::ContextLoad` if a path cannot be read
pub fn prepare_material(config: &Config, args: &MaterialArgs) -> Result<Material> {
    if args.no_instructions {
        tracing::debug!("Instructions and datasets disabled");
        return Ok(Material::default());
    }

    let mut instructions = config.custom_instructions.clone();
    let mut datasets = config.curated_datasets.clone();

    if let Some(name) = &args.profile {
        let profile = config.profile(name)?;
        instructions.extend(profile.custom_instructions.iter().cloned());
        datasets.extend(profile.curated_datasets.iter().cloned());
    }
    instructions.extend(args.instructions.iter().cloned());
    datasets.extend(args.datasets.iter().cloned());

    Ok(Material {
        instructions: load_material(&instructions)?,
        datasets: load_material(&datasets)?,
    })
}

// Chat command handler
pub mod chat {
    //! Interactive chat handler.
    //!
    //! Builds the dispatcher and session store, optionally loads a saved
    //! session, and runs a readline loop feeding each line to a
    //! [`ChatSession`].

    use super::*;
    use crate::chat_session::{print_help, ChatSession, LineOutcome, SessionState};
    use crate::cli::GenerationArgs;
    use crate::config::GenerationParams;
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Start an interactive conversation
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `generation` - Engine and parameter overrides
    /// * `material` - Instruction and dataset sources
    /// * `load` - Saved session to continue; suppresses all material
    ///
    /// # Errors
    ///
    /// Returns error if the engine, parameters, material, or requested
    /// session cannot be resolved. Failures inside the loop are reported and
    /// the loop continues.
    pub async fn run_chat(
        config: Config,
        generation: GenerationArgs,
        material: MaterialArgs,
        load: Option<String>,
    ) -> Result<()> {
        let store = SessionStore::from_config(&config)?;
        let dispatcher = Dispatcher::from_config(&config)?;
        let engine = config.select_engine(generation.engine.as_deref())?;
        let params = config.resolve_params(engine, &generation.overrides())?;

        let (prior, material) = match &load {
            Some(name) => {
                tracing::info!("Continuing session {}", name);
                (Some(store.load(name)?), Material::default())
            }
            None => (None, prepare_material(&config, &material)?),
        };

        print_welcome_banner(&engine.name, &params, &material, load.as_deref());

        let mut session = ChatSession::new(
            &dispatcher,
            &store,
            Some(engine.name.clone()),
            params,
            prior,
        )
        .with_material(material.instructions.texts, material.datasets.texts);

        let mut rl = DefaultEditor::new()?;

        loop {
            match rl.readline(&format!("{} ", ">".green().bold())) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        rl.add_history_entry(trimmed)?;
                    }

                    let outcome = session.handle_line(trimmed).await;
                    render_outcome(outcome);

                    if session.state() == SessionState::Terminated {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn render_outcome(outcome: LineOutcome) {
        match outcome {
            LineOutcome::Ignored | LineOutcome::Quit => {}
            LineOutcome::Replied(reply) => println!("\n{}\n", reply),
            LineOutcome::Saved { name, path } => {
                println!(
                    "{}",
                    format!("Saved session {} to {}", name, path.display()).green()
                );
            }
            LineOutcome::ShowHelp => print_help(),
            LineOutcome::Rejected(e) => eprintln!("{}", e.to_string().yellow()),
            LineOutcome::Failed(e) => eprintln!("{}", format!("Error: {:#}", e).red()),
        }
    }

    fn print_welcome_banner(
        engine: &str,
        params: &GenerationParams,
        material: &Material,
        session: Option<&str>,
    ) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                  Ragbot Interactive Chat                     ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        if let Some(name) = session {
            println!("Session:      {}", name.cyan());
        }

        let files: Vec<String> = material
            .instructions
            .files
            .iter()
            .chain(material.datasets.files.iter())
            .map(|f| f.display().to_string())
            .collect();
        if files.is_empty() {
            println!("Files used:   {}", "none".dimmed());
        } else {
            println!("Files used:");
            for file in &files {
                println!("  - {}", file);
            }
            let tokens =
                material.instructions.estimated_tokens() + material.datasets.estimated_tokens();
            println!("Tokens used:  ~{}", tokens);
        }

        println!("Engine:       {}", engine.cyan());
        println!("Model:        {}", params.model.cyan());
        println!("Temperature:  {}", params.temperature);
        println!("Max tokens:   {}", params.max_tokens);
        println!(
            "Date:         {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        println!("Type '/help' for available commands, '/quit' to leave\n");
    }
}

// One-shot prompt handler
pub mod ask {
    //! Non-interactive handler: one history, one dispatch, one printed reply.

    use super::*;
    use crate::cli::{GenerationArgs, PromptSource};
    use std::io::Read;

    /// Resolve the prompt text from exactly one source
    ///
    /// The resolved text is trimmed. An empty result is still a prompt and
    /// is sent as an empty user turn.
    ///
    /// # Errors
    ///
    /// Returns `RagbotError::Input` when no source is given or the file or
    /// stdin cannot be read
    pub fn resolve_prompt<R: Read>(source: &PromptSource, mut stdin: R) -> Result<String> {
        let text = if let Some(prompt) = &source.prompt {
            prompt.clone()
        } else if let Some(path) = &source.prompt_file {
            std::fs::read_to_string(path).map_err(|e| {
                RagbotError::Input(format!(
                    "Failed to read prompt file {}: {}",
                    path.display(),
                    e
                ))
            })?
        } else if source.stdin {
            let mut buffer = String::new();
            stdin
                .read_to_string(&mut buffer)
                .map_err(|e| RagbotError::Input(format!("Failed to read stdin: {}", e)))?;
            buffer
        } else {
            return Err(RagbotError::Input("No prompt source given".to_string()).into());
        };

        Ok(text.trim().to_string())
    }

    /// Send one prompt and print the (structured) reply
    ///
    /// # Errors
    ///
    /// Returns error if input, material, engine, or dispatch fails
    pub async fn run_ask(
        config: Config,
        generation: GenerationArgs,
        material: MaterialArgs,
        source: PromptSource,
    ) -> Result<()> {
        let prompt = resolve_prompt(&source, std::io::stdin())?;
        let reply = ask_once(&config, &generation, &material, prompt).await?;
        println!("{}", extract_structured_output(&reply));
        Ok(())
    }

    /// Build a fresh history around `prompt` and dispatch it once
    pub async fn ask_once(
        config: &Config,
        generation: &GenerationArgs,
        material: &MaterialArgs,
        prompt: String,
    ) -> Result<String> {
        let dispatcher = Dispatcher::from_config(config)?;
        let engine = config.select_engine(generation.engine.as_deref())?;
        let params = config.resolve_params(engine, &generation.overrides())?;
        let material = prepare_material(config, material)?;

        let history = HistoryBuilder::new()
            .instructions(material.instructions.texts)
            .datasets(material.datasets.texts)
            .prompt(prompt)
            .build()?;

        dispatcher
            .dispatch(Some(&engine.name), &history, &params)
            .await
    }

}

// Session listing handler
pub mod sessions {
    //! Prints saved session names.

    use super::*;

    /// Print every saved session name, one per line
    ///
    /// # Errors
    ///
    /// Returns error if the sessions directory cannot be read
    pub fn list_sessions(config: &Config) -> Result<()> {
        let store = SessionStore::from_config(config)?;
        let names = store.list()?;

        if names.is_empty() {
            println!("No saved sessions in {}", store.sessions_dir().display());
            return Ok(());
        }

        for name in names {
            println!("{}", name);
        }
        Ok(())
    }
}
