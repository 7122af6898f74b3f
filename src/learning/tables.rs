//! Text checkpoints for the learned tables.
//!
//! A checkpoint is seven sections separated by blank lines, one line per
//! state, in the order: MC values, TD values, Q values, MC return sums,
//! MC visit counts, TD visit counts, Q visit counts. Each line is the state
//! followed by its entry, for example `(14,0,6) -0.25` or `(14,0,6) [0.5,-1]`.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use crate::blackjack::{states, State};

use super::Agent;

impl Agent {
    /// Write every table to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut output = String::new();
        write_values(&mut output, &self.mc_values);
        write_values(&mut output, &self.td_values);
        for state in states() {
            let q = self.q_values[&state];
            writeln!(output, "{} [{},{}]", state, q[0], q[1]).unwrap();
        }
        output.push('\n');
        write_values(&mut output, &self.mc_return_sums);
        write_counts(&mut output, &self.mc_visits);
        write_counts(&mut output, &self.td_visits);
        write_counts(&mut output, &self.q_visits);
        fs::write(path, output)
    }

    /// Read an agent back from a file written by [`Agent::save`]. Malformed
    /// files fail with [`io::ErrorKind::InvalidData`].
    pub fn load(path: impl AsRef<Path>) -> io::Result<Agent> {
        let contents = fs::read_to_string(path)?;
        let mut sections = contents.split("\n\n");
        let mut next_section = || {
            sections
                .next()
                .ok_or_else(|| invalid_data("checkpoint has too few sections".to_string()))
        };
        let agent = Agent {
            mc_values: read_table(next_section()?, parse_value)?,
            td_values: read_table(next_section()?, parse_value)?,
            q_values: read_table(next_section()?, parse_pair)?,
            mc_return_sums: read_table(next_section()?, parse_value)?,
            mc_visits: read_table(next_section()?, parse_count)?,
            td_visits: read_table(next_section()?, parse_count)?,
            q_visits: read_table(next_section()?, parse_count)?,
        };
        Ok(agent)
    }
}

fn write_values(output: &mut String, table: &HashMap<State, f64>) {
    for state in states() {
        writeln!(output, "{} {}", state, table[&state]).unwrap();
    }
    output.push('\n');
}

fn write_counts(output: &mut String, table: &HashMap<State, u32>) {
    for state in states() {
        writeln!(output, "{} {}", state, table[&state]).unwrap();
    }
    output.push('\n');
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

/// Split a checkpoint line into its state and the entry text after it.
fn split_entry(line: &str) -> io::Result<(State, &str)> {
    let (state, rest) = line
        .split_once(' ')
        .ok_or_else(|| invalid_data(format!("checkpoint line \"{}\" has no entry", line)))?;
    let state = State::from_str(state).map_err(invalid_data)?;
    Ok((state, rest))
}

fn read_table<T>(section: &str, parse: fn(&str) -> io::Result<T>) -> io::Result<HashMap<State, T>> {
    let mut table = HashMap::new();
    for line in section.lines().filter(|line| !line.trim().is_empty()) {
        let (state, entry) = split_entry(line)?;
        table.insert(state, parse(entry)?);
    }
    Ok(table)
}

fn parse_value(entry: &str) -> io::Result<f64> {
    entry
        .trim()
        .parse()
        .map_err(|err| invalid_data(format!("bad value \"{}\": {}", entry, err)))
}

fn parse_count(entry: &str) -> io::Result<u32> {
    entry
        .trim()
        .parse()
        .map_err(|err| invalid_data(format!("bad count \"{}\": {}", entry, err)))
}

fn parse_pair(entry: &str) -> io::Result<[f64; 2]> {
    let inner = entry
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| invalid_data(format!("bad action values \"{}\"", entry)))?;
    let (hit, stand) = inner
        .split_once(',')
        .ok_or_else(|| invalid_data(format!("bad action values \"{}\"", entry)))?;
    Ok([parse_value(hit)?, parse_value(stand)?])
}
