//! The driver: wires the password acquisition policy to the container.
//!
//! Password precedence: `--password-from` file, then the `PASSWORD`
//! environment variable, then an interactive prompt on the controlling
//! terminal. Interactive encryption confirms the password; interactive
//! decryption re-prompts on a failed tag up to the retry limit.

use std::io::{Read, Write};

use anyhow::{bail, Context, Result};
use subtle::ConstantTimeEq;
use tokio_util::sync::CancellationToken;
use zeroize::Zeroizing;

use goenc_crypto::{check_container, open, seal, Params};
use goenc_prompt::Prompt;

use crate::options::Options;

/// A post-parse usage error; exits 2 like any other command-line problem.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct UsageError(pub String);

pub async fn run(opts: &Options) -> Result<()> {
    if opts.password_from.as_deref() == Some("-") && opts.input == "-" {
        return Err(UsageError(
            "cannot read both the password and the input from standard input".into(),
        )
        .into());
    }

    let input = read_input(&opts.input)?;
    if opts.decrypt {
        decrypt(opts, &input).await
    } else {
        encrypt(opts, &input).await
    }
}

async fn encrypt(opts: &Options, plaintext: &[u8]) -> Result<()> {
    let params = Params {
        time: opts.time,
        memory: opts.memory,
        threads: opts.parallelism,
    };
    tracing::debug!(time = params.time, memory = params.memory, threads = params.threads, "sealing");

    let password = match configured_password(opts)? {
        Some(password) => password,
        None => prompt_new_password().await?,
    };

    let sealed = seal(&password, plaintext, &params)?;
    write_output(opts, &sealed)
}

async fn decrypt(opts: &Options, input: &[u8]) -> Result<()> {
    // A malformed container fails here, before anyone is asked for a password.
    check_container(input)?;

    if let Some(password) = configured_password(opts)? {
        let plaintext = open(&password, input)?;
        return write_output(opts, &plaintext);
    }

    let mut prompt = Prompt::open()?;
    let cancel = CancellationToken::new();
    let mut remaining = opts.retries;
    loop {
        let password = prompt.read_password("Password: ", &cancel).await?;
        match open(&password, input) {
            Ok(plaintext) => return write_output(opts, &plaintext),
            Err(err @ goenc_crypto::Error::InvalidTag) => {
                remaining -= 1;
                if remaining == 0 {
                    return Err(err.into());
                }
                eprintln!("incorrect password. try again.");
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// The non-interactive password, if one is configured.
fn configured_password(opts: &Options) -> Result<Option<Zeroizing<Vec<u8>>>> {
    if let Some(path) = &opts.password_from {
        let bytes = if path == "-" {
            let mut buf = Vec::new();
            std::io::stdin()
                .lock()
                .read_to_end(&mut buf)
                .context("reading password from standard input")?;
            buf
        } else {
            std::fs::read(path).with_context(|| format!("reading password file {path}"))?
        };
        return Ok(Some(Zeroizing::new(bytes)));
    }
    if let Some(value) = std::env::var_os("PASSWORD") {
        return Ok(Some(Zeroizing::new(value.into_encoded_bytes())));
    }
    Ok(None)
}

async fn prompt_new_password() -> Result<Zeroizing<Vec<u8>>> {
    let mut prompt = Prompt::open()?;
    let cancel = CancellationToken::new();
    let password = prompt.read_password("Password: ", &cancel).await?;
    let confirm = prompt.read_password("Confirm Password: ", &cancel).await?;
    if !bool::from(password.as_slice().ct_eq(confirm.as_slice())) {
        bail!("passwords do not match");
    }
    Ok(password)
}

fn read_input(path: &str) -> Result<Vec<u8>> {
    if path == "-" {
        let mut buf = Vec::new();
        std::io::stdin()
            .lock()
            .read_to_end(&mut buf)
            .context("reading standard input")?;
        Ok(buf)
    } else {
        std::fs::read(path).with_context(|| format!("reading {path}"))
    }
}

fn write_output(opts: &Options, data: &[u8]) -> Result<()> {
    if opts.output == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(data)
            .and_then(|()| stdout.flush())
            .context("writing standard output")?;
        return Ok(());
    }

    let path = &opts.output;
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .create_new(opts.no_clobber)
        .open(path)
        .with_context(|| format!("creating {path}"))?;
    file.write_all(data)
        .with_context(|| format!("writing {path}"))?;
    Ok(())
}
