use crate::utils::constants::KEYSPACE;
use crate::utils::types::{Address, Key};

/// Benign acknowledgment, also the reply to unknown commands.
pub static ACK: &str = "Done";
/// Non-empty token returned by the liveness probe.
pub static ALIVE_TOKEN: &str = "Alive";

/// One request line of the wire protocol. Fields are separated by `:`;
/// the line is terminated by `\n` on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    YourSuccessor,
    YourPredecessor,
    FindSuccessor(Key),
    FindPredecessor(Key),
    ChangeSuccessor(Address),
    ChangePredecessor(Address),
    UpdateIthFinger(usize, Address),
    TransferKeys(Key, Key),
    Notify(Address),
    Alive,
    Unknown(String),
}

impl Request {
    /// Single-line wire form, without the trailing newline.
    pub fn encode(&self) -> String {
        match self {
            Request::YourSuccessor => "YourSuccessor".to_string(),
            Request::YourPredecessor => "YourPredecessor".to_string(),
            Request::FindSuccessor(id) => format!("FindSuccessor:{}", id),
            Request::FindPredecessor(id) => format!("FindPredecessor:{}", id),
            Request::ChangeSuccessor(address) => format!("ChangeSuccessor:{}", address),
            Request::ChangePredecessor(address) => format!("ChangePredecessor:{}", address),
            Request::UpdateIthFinger(index, address) => format!("UpdateithFinger:{}:{}", index, address),
            Request::TransferKeys(first, second) => format!("TransferKeys:{}:{}", first, second),
            Request::Notify(address) => format!("Notify:{}", address),
            Request::Alive => "Alive".to_string(),
            Request::Unknown(line) => line.clone(),
        }
    }

    /// Parses one request line. Anything that does not match the
    /// command table comes back as `Unknown`, which the handler
    /// answers with a benign ack so a confused caller does not
    /// mistake this node for dead.
    pub fn parse(line: &str) -> Request {
        let line = line.trim_end();
        let (command, args) = match line.split_once(':') {
            Some((command, args)) => (command, Some(args)),
            None => (line, None),
        };
        let parsed = match (command, args) {
            ("YourSuccessor", None) => Some(Request::YourSuccessor),
            ("YourPredecessor", None) => Some(Request::YourPredecessor),
            ("Alive", None) => Some(Request::Alive),
            ("FindSuccessor", Some(args)) => parse_key(args).map(Request::FindSuccessor),
            ("FindPredecessor", Some(args)) => parse_key(args).map(Request::FindPredecessor),
            ("ChangeSuccessor", Some(args)) => args.parse().ok().map(Request::ChangeSuccessor),
            ("ChangePredecessor", Some(args)) => args.parse().ok().map(Request::ChangePredecessor),
            ("Notify", Some(args)) => args.parse().ok().map(Request::Notify),
            ("UpdateithFinger", Some(args)) => args.split_once(':').and_then(|(index, address)| {
                Some(Request::UpdateIthFinger(index.parse().ok()?, address.parse().ok()?))
            }),
            ("TransferKeys", Some(args)) => args.split_once(':').and_then(|(first, second)| {
                Some(Request::TransferKeys(parse_key(first)?, parse_key(second)?))
            }),
            _ => None,
        };
        parsed.unwrap_or_else(|| Request::Unknown(line.to_string()))
    }
}

/// Ids arriving off the wire are reduced into the keyspace.
fn parse_key(raw: &str) -> Option<Key> {
    raw.parse::<Key>().ok().map(|id| id & (KEYSPACE - 1))
}
