//! Command Parser
//!
//! Parses telnet command lines for remote management.

use std::collections::HashMap;

/// Telnet command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Show help
    Help,
    /// List attack types
    ListAttacks,
    /// Start an attack
    Start {
        attack_type: String,
        interface: String,
        target: Option<String>,
        options: HashMap<String, String>,
    },
    /// Stop an attack by type
    Stop { attack_type: String },
    /// Show registered attacks and counters
    Status { json: bool },
    /// Show the most recent activity log entries
    Logs { limit: Option<usize> },
    /// Look for a DHCP server
    Recon { interface: String },
    /// Stop all attacks
    StopAll,
    /// Exit the session
    Exit,
}

/// Command parser
pub struct CommandParser;

impl CommandParser {
    /// Parse a command line
    pub fn parse(line: &str) -> Result<Command, String> {
        let line = line.trim();
        if line.is_empty() {
            return Err("Empty command".to_string());
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "help" | "?" => Ok(Command::Help),
            "attacks" | "list-attacks" => Ok(Command::ListAttacks),
            "start" => Self::parse_start(&parts[1..]),
            "stop" => match parts.get(1) {
                Some(attack_type) => Ok(Command::Stop {
                    attack_type: attack_type.to_string(),
                }),
                None => Err("Usage: stop <type>".to_string()),
            },
            "status" => match parts.get(1) {
                None => Ok(Command::Status { json: false }),
                Some(&"--json") | Some(&"json") => Ok(Command::Status { json: true }),
                Some(other) => Err(format!("Unknown status flag: {}", other)),
            },
            "logs" => {
                let limit = parts
                    .get(1)
                    .map(|n| {
                        n.parse::<usize>()
                            .map_err(|_| format!("Invalid entry count: {}", n))
                    })
                    .transpose()?;
                Ok(Command::Logs { limit })
            }
            "recon" => match parts.get(1) {
                Some(interface) => Ok(Command::Recon {
                    interface: interface.to_string(),
                }),
                None => Err("Usage: recon <iface>".to_string()),
            },
            "stop-all" | "stopall" => Ok(Command::StopAll),
            "exit" | "quit" | "q" => Ok(Command::Exit),
            _ => Err(format!(
                "Unknown command: {}. Type 'help' for available commands.",
                cmd
            )),
        }
    }

    /// Parse start command arguments
    fn parse_start(parts: &[&str]) -> Result<Command, String> {
        // start <type> <iface> [target] [key=value ...]
        if parts.len() < 2 {
            return Err("Usage: start <type> <iface> [target] [key=value ...]".to_string());
        }

        let attack_type = parts[0].to_string();
        let interface = parts[1].to_string();

        let mut rest = &parts[2..];
        let target = match rest.first() {
            Some(first) if !first.contains('=') => {
                rest = &rest[1..];
                Some(first.to_string())
            }
            _ => None,
        };

        let mut options = HashMap::new();
        for part in rest {
            match part.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    options.insert(key.to_string(), value.to_string());
                }
                _ => {
                    return Err(format!(
                        "Invalid option format: {}. Expected key=value",
                        part
                    ))
                }
            }
        }

        Ok(Command::Start {
            attack_type,
            interface,
            target,
            options,
        })
    }

    /// Get help text
    pub fn help_text() -> &'static str {
        r#"
Available Commands:
==================

Attack Management:
  attacks, list-attacks                   - List attack types
  start <type> <iface> [target] [k=v ...] - Start an attack
                                            Example: start nak eth0 192.168.1.50 server_id=192.168.1.1
                                            Example: start rogue_server eth0 gateway=10.0.0.66 dns=10.0.0.66
  stop <type>                             - Stop an attack
  stop-all, stopall                       - Stop all attacks
  status [--json]                         - Show attacks and counters
  logs [n]                                - Show the activity log (last n entries)

Discovery:
  recon <iface>                           - Look for a DHCP server

General:
  help, ?                                 - Show this help message
  exit, quit, q                           - Close connection

Notes:
  - Only one attack of each type can run at a time
  - nak and release need a target address
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_help() {
        assert_eq!(CommandParser::parse("help").unwrap(), Command::Help);
        assert_eq!(CommandParser::parse("?").unwrap(), Command::Help);
        assert_eq!(CommandParser::parse("  HELP  ").unwrap(), Command::Help);
    }

    #[test]
    fn test_parse_start_with_target_and_options() {
        match CommandParser::parse("start nak eth0 192.168.1.50 server_id=192.168.1.1").unwrap() {
            Command::Start {
                attack_type,
                interface,
                target,
                options,
            } => {
                assert_eq!(attack_type, "nak");
                assert_eq!(interface, "eth0");
                assert_eq!(target.as_deref(), Some("192.168.1.50"));
                assert_eq!(options.get("server_id"), Some(&"192.168.1.1".to_string()));
            }
            other => panic!("Wrong command type: {:?}", other),
        }
    }

    #[test]
    fn test_parse_start_options_only() {
        match CommandParser::parse("start rogue_server eth0 dns=8.8.8.8,1.1.1.1").unwrap() {
            Command::Start { target, options, .. } => {
                assert_eq!(target, None);
                assert_eq!(options.get("dns"), Some(&"8.8.8.8,1.1.1.1".to_string()));
            }
            other => panic!("Wrong command type: {:?}", other),
        }
    }

    #[test]
    fn test_parse_start_errors() {
        assert!(CommandParser::parse("start flood").is_err());
        assert!(CommandParser::parse("start nak eth0 10.0.0.1 junk").is_err());
        assert!(CommandParser::parse("start nak eth0 =5").is_err());
    }

    #[test]
    fn test_parse_status_and_logs() {
        assert_eq!(
            CommandParser::parse("status").unwrap(),
            Command::Status { json: false }
        );
        assert_eq!(
            CommandParser::parse("status --json").unwrap(),
            Command::Status { json: true }
        );
        assert_eq!(
            CommandParser::parse("logs 5").unwrap(),
            Command::Logs { limit: Some(5) }
        );
        assert!(CommandParser::parse("logs many").is_err());
    }

    #[test]
    fn test_parse_exit() {
        assert_eq!(CommandParser::parse("exit").unwrap(), Command::Exit);
        assert_eq!(CommandParser::parse("quit").unwrap(), Command::Exit);
        assert_eq!(CommandParser::parse("q").unwrap(), Command::Exit);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(CommandParser::parse("invalid").is_err());
        assert!(CommandParser::parse("").is_err());
        assert!(CommandParser::parse("stop").is_err());
        assert!(CommandParser::parse("recon").is_err());
    }
}
