//! Process-level tests of the console binary.

#![cfg(unix)]

use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

const EXIT_DEADLINE: Duration = Duration::from_secs(10);

struct Bot {
    child: Child,
    log: mpsc::Receiver<String>,
}

impl Bot {
    fn start() -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_eth_vanity_bot"))
            .args(["--workers", "1"])
            .env("RUST_LOG", "eth_vanity_bot=info")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();

        // Drain stderr so the bot never blocks on a full pipe
        let stderr = child.stderr.take().unwrap();
        let (tx, log) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        let bot = Self { child, log };
        bot.wait_for_log("bot started");
        bot
    }

    fn wait_for_log(&self, needle: &str) {
        let deadline = Instant::now() + EXIT_DEADLINE;
        while let Some(left) = deadline.checked_duration_since(Instant::now()) {
            match self.log.recv_timeout(left) {
                Ok(line) if line.contains(needle) => return,
                Ok(_) => continue,
                Err(_) => break,
            }
        }
        panic!("bot never logged {:?}", needle);
    }

    fn send(&mut self, line: &str) {
        let stdin = self.child.stdin.as_mut().unwrap();
        writeln!(stdin, "{}", line).unwrap();
        stdin.flush().unwrap();
    }

    fn interrupt(&self) {
        let status = Command::new("kill")
            .args(["-INT", &self.child.id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());
    }

    /// Waits for the process to exit, killing it if it overstays.
    fn wait_for_exit(&mut self) -> ExitStatus {
        let deadline = Instant::now() + EXIT_DEADLINE;
        loop {
            if let Some(status) = self.child.try_wait().unwrap() {
                return status;
            }
            if Instant::now() >= deadline {
                let _ = self.child.kill();
                let _ = self.child.wait();
                panic!("bot did not exit within {:?}", EXIT_DEADLINE);
            }
            thread::sleep(Duration::from_millis(50));
        }
    }

    fn stdout(&mut self) -> String {
        let mut out = String::new();
        self.child
            .stdout
            .take()
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        out
    }
}

#[test]
fn test_interrupt_exits_while_stdin_is_idle() {
    let mut bot = Bot::start();

    // stdin stays open and silent
    bot.interrupt();

    assert!(bot.wait_for_exit().success());
}

#[test]
fn test_interrupt_cancels_running_search_and_exits() {
    let mut bot = Bot::start();

    bot.send("/generate ffffff ffffff");
    bot.wait_for_log("search submitted");
    bot.interrupt();

    assert!(bot.wait_for_exit().success());
    let out = bot.stdout();
    assert!(out.contains("Searching for an address matching 0xffffff...ffffff"));
    assert!(out.contains("shutting down"));
}

#[test]
fn test_end_of_input_exits() {
    let mut bot = Bot::start();

    bot.send("/start");
    drop(bot.child.stdin.take());

    assert!(bot.wait_for_exit().success());
    assert!(bot.stdout().contains("/generate <prefix> [suffix]"));
}
