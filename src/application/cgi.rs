//! # Ejecución de Scripts CGI
//! src/application/cgi.rs
//!
//! Un script CGI se ejecuta como proceso hijo:
//!
//! 1. La primera línea del script (`#!/bin/sh`) indica el intérprete.
//! 2. El environ del request, sin las claves internas `frask.`, es el
//!    entorno completo del hijo. El entorno del servidor no se modifica.
//! 3. stdout se captura en un thread lector; stderr se hereda.
//! 4. Se espera hasta el timeout: si vence, el hijo se mata y la respuesta
//!    es `408 Request Timeout`.
//!
//! ```text
//! worker ──spawn──► intérprete script ──stdout──► thread lector ──mpsc──► worker
//! ```

use crate::error::ApplicationError;
use crate::http::{FieldMap, Response, StatusCode, ENVIRON_PRIVATE_PREFIX};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Intervalo entre consultas de estado del hijo
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Tiempo extra para recoger la salida después de que el hijo terminó
const DRAIN_GRACE: Duration = Duration::from_millis(100);

/// Ejecuta un script y convierte su salida en una respuesta
///
/// - éxito → `200` con stdout (UTF-8 con pérdida) como body
/// - timeout → `408`
/// - código de salida distinto de cero → `Err(CgiExecuting)`
pub fn execute(
    script: &Path,
    root: &Path,
    environ: &FieldMap,
    timeout: Duration,
) -> Result<Response, ApplicationError> {
    let (program, args) = interpreter(script)?;

    let mut child = Command::new(&program)
        .args(&args)
        .arg(script)
        .env_clear()
        .envs(child_environ(environ))
        .current_dir(root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| cgi_error(format!("failed to spawn {}: {}", program, e)))?;

    debug!(pid = child.id(), script = %script.display(), "CGI script started");

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| cgi_error("child stdout not captured"))?;

    // El lector drena el pipe para que el hijo nunca se bloquee escribiendo
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut output = Vec::new();
        let result = stdout.read_to_end(&mut output).map(|_| output);
        let _ = tx.send(result);
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                warn!(
                    pid = child.id(),
                    script = %script.display(),
                    timeout_ms = timeout.as_millis() as u64,
                    "CGI script timed out, killing it"
                );
                let _ = child.kill();
                let _ = child.wait();
                let _ = rx.recv_timeout(DRAIN_GRACE);
                return Ok(Response::new(StatusCode::REQUEST_TIMEOUT));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(cgi_error(format!("failed waiting for child: {}", e))),
        }
    };

    check_status(status, script)?;

    // Un nieto que heredó stdout puede mantener el pipe abierto
    let wait = deadline.saturating_duration_since(Instant::now()) + DRAIN_GRACE;
    let output = rx
        .recv_timeout(wait)
        .map_err(|_| cgi_error("script output was not closed"))?
        .map_err(|e| cgi_error(format!("failed reading script output: {}", e)))?;

    Ok(Response::new(StatusCode::OK).with_body(&String::from_utf8_lossy(&output)))
}

/// Intérprete y argumentos extra según la primera línea del script
///
/// `#!/usr/bin/env python3` produce `("/usr/bin/env", ["python3"])`.
fn interpreter(script: &Path) -> Result<(String, Vec<String>), ApplicationError> {
    let file = File::open(script)
        .map_err(|e| cgi_error(format!("cannot open {}: {}", script.display(), e)))?;

    let mut first_line = String::new();
    BufReader::new(file)
        .read_line(&mut first_line)
        .map_err(|e| cgi_error(format!("cannot read {}: {}", script.display(), e)))?;

    let line = first_line.trim_matches(|c| matches!(c, '#' | '!' | ' ' | '\r' | '\n'));
    let mut parts = line.split_whitespace().map(str::to_string);

    let program = parts
        .next()
        .ok_or_else(|| cgi_error(format!("{} has no interpreter line", script.display())))?;

    Ok((program, parts.collect()))
}

/// Environ sin las claves internas
fn child_environ(environ: &FieldMap) -> impl Iterator<Item = (&str, &str)> {
    environ
        .iter()
        .filter(|(key, _)| !key.starts_with(ENVIRON_PRIVATE_PREFIX))
}

fn check_status(status: ExitStatus, script: &Path) -> Result<(), ApplicationError> {
    if status.success() {
        return Ok(());
    }
    Err(cgi_error(format!(
        "{} exited with {}",
        script.display(),
        status
    )))
}

fn cgi_error(message: impl Into<String>) -> ApplicationError {
    ApplicationError::CgiExecuting(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn write_script(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn environ() -> FieldMap {
        [
            ("REQUEST_METHOD", "GET"),
            ("QUERY_STRING", "name=Ana"),
            ("frask.url_scheme", "http"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_interpreter_from_shebang() {
        let dir = TempDir::new().unwrap();
        let script = write_script(&dir, "a.py", "#!/usr/bin/env python3\nprint(1)\n");
        let (program, args) = interpreter(&script).unwrap();
        assert_eq!(program, "/usr/bin/env");
        assert_eq!(args, vec!["python3"]);

        let script = write_script(&dir, "b.sh", "#! /bin/sh\r\necho hi\r\n");
        assert_eq!(interpreter(&script).unwrap(), ("/bin/sh".to_string(), vec![]));
    }

    #[test]
    fn test_missing_interpreter_line() {
        let dir = TempDir::new().unwrap();
        let script = write_script(&dir, "empty.sh", "");
        assert!(matches!(
            interpreter(&script),
            Err(ApplicationError::CgiExecuting(_))
        ));
    }

    #[test]
    fn test_execute_success_passes_environ() {
        let dir = TempDir::new().unwrap();
        let script = write_script(
            &dir,
            "env.sh",
            "#!/bin/sh\necho \"$REQUEST_METHOD $QUERY_STRING\"\nenv | grep -c '^frask' || true\n",
        );

        let response = execute(&script, dir.path(), &environ(), Duration::from_secs(5)).unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = String::from_utf8(response.body().unwrap().to_vec()).unwrap();
        assert!(body.starts_with("GET name=Ana\n"));
        assert!(body.ends_with("0\n"));
    }

    #[test]
    fn test_execute_runs_in_root() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("data.txt"), "contenido").unwrap();
        let script = write_script(&dir, "cat.sh", "#!/bin/sh\ncat data.txt\n");

        let response =
            execute(&script, dir.path(), &FieldMap::new(), Duration::from_secs(5)).unwrap();
        assert_eq!(response.body(), Some(&b"contenido"[..]));
    }

    #[test]
    fn test_non_zero_exit_is_error() {
        let dir = TempDir::new().unwrap();
        let script = write_script(&dir, "fail.sh", "#!/bin/sh\necho partial\nexit 3\n");

        let result = execute(&script, dir.path(), &environ(), Duration::from_secs(5));
        assert!(matches!(result, Err(ApplicationError::CgiExecuting(_))));
    }

    #[test]
    fn test_timeout_returns_408() {
        let dir = TempDir::new().unwrap();
        let script = write_script(&dir, "slow.sh", "#!/bin/sh\nexec sleep 10\n");

        let started = Instant::now();
        let response =
            execute(&script, dir.path(), &environ(), Duration::from_millis(200)).unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_unknown_interpreter_is_error() {
        let dir = TempDir::new().unwrap();
        let script = write_script(&dir, "x.cgi", "#!/nonexistent/interpreter\n");

        let result = execute(&script, dir.path(), &environ(), Duration::from_secs(1));
        assert!(matches!(result, Err(ApplicationError::CgiExecuting(_))));
    }
}
