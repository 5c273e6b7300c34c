/// Tracked users and channel descriptors.
///
/// Both are loaded from small CSV files: the users file is the output of
/// `snitch list-users` (usually pared down by hand), the channel files hold a
/// single `channel_id,channel_name` row after the header.
use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    pub user_id: String,
    pub user_name: String,
    pub real_name: String,
}

impl User {
    pub fn new(user_id: &str, user_name: &str, real_name: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            real_name: real_name.to_string(),
        }
    }

    /// Slack mention markup, e.g. `<@U123|alice>`
    pub fn mention(&self) -> String {
        format!("<@{}|{}>", self.user_id, self.user_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Channel {
    pub channel_id: String,
    pub channel_name: String,
}

impl Channel {
    pub fn new(channel_id: &str, channel_name: &str) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            channel_name: channel_name.to_string(),
        }
    }

    /// Slack channel link markup, e.g. `<#C123|standup>`
    pub fn mention(&self) -> String {
        format!("<#{}|{}>", self.channel_id, self.channel_name)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open channel file: {}", path.display()))?;
        Self::from_reader(file)
            .with_context(|| format!("Failed to parse channel file: {}", path.display()))
    }

    /// Reads the first record after the header; extra rows are ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv_reader(reader);
        match rdr.deserialize::<Channel>().next() {
            Some(record) => {
                let channel = record?;
                if channel.channel_id.is_empty() {
                    bail!("channel_id is empty");
                }
                Ok(channel)
            }
            None => bail!("no channel row found after the header"),
        }
    }
}

/// Tracked users keyed by `user_id`, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserDirectory {
    users: IndexMap<String, User>,
}

impl UserDirectory {
    pub fn from_users<I>(users: I) -> Self
    where
        I: IntoIterator<Item = User>,
    {
        let mut map = IndexMap::new();
        for user in users {
            map.entry(user.user_id.clone()).or_insert(user);
        }
        Self { users: map }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open user file: {}", path.display()))?;
        Self::from_reader(file)
            .with_context(|| format!("Failed to parse user file: {}", path.display()))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv_reader(reader);
        let mut users = Vec::new();
        for (index, record) in rdr.deserialize::<User>().enumerate() {
            let user = record.with_context(|| format!("Invalid user row {}", index + 1))?;
            if user.user_id.is_empty() {
                bail!("Invalid user row {}: user_id is empty", index + 1);
            }
            users.push(user);
        }
        Ok(Self::from_users(users))
    }

    /// Write users as CSV with the `user_id,user_name,real_name` header.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for user in self.users.values() {
            wtr.serialize(user)?;
        }
        if self.users.is_empty() {
            wtr.write_record(["user_id", "user_name", "real_name"])?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn get(&self, user_id: &str) -> Option<&User> {
        self.users.get(user_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_users_in_file_order() {
        let data = "user_id,user_name,real_name\nU2,bob,Bob Brown\nU1,alice,Alice Adams\n";
        let directory = UserDirectory::from_reader(data.as_bytes()).unwrap();
        assert_eq!(directory.len(), 2);
        let ids: Vec<&str> = directory.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, vec!["U2", "U1"]);
        assert_eq!(directory.get("U1").unwrap().real_name, "Alice Adams");
    }

    #[test]
    fn test_duplicate_user_keeps_first() {
        let directory = UserDirectory::from_users(vec![
            User::new("U1", "alice", "Alice"),
            User::new("U1", "alice2", "Alice Again"),
        ]);
        assert_eq!(directory.len(), 1);
        assert_eq!(directory.get("U1").unwrap().user_name, "alice");
    }

    #[test]
    fn test_users_missing_column_is_an_error() {
        let data = "user_id,user_name\nU1,alice\n";
        assert!(UserDirectory::from_reader(data.as_bytes()).is_err());
    }

    #[test]
    fn test_users_trimmed() {
        let data = "user_id, user_name, real_name\nU1 , alice , Alice Adams \n";
        let directory = UserDirectory::from_reader(data.as_bytes()).unwrap();
        assert_eq!(directory.get("U1").unwrap().real_name, "Alice Adams");
    }

    #[test]
    fn test_channel_first_row() {
        let data = "channel_id,channel_name\nC1,standup\nC2,random\n";
        let channel = Channel::from_reader(data.as_bytes()).unwrap();
        assert_eq!(channel, Channel::new("C1", "standup"));
        assert_eq!(channel.mention(), "<#C1|standup>");
    }

    #[test]
    fn test_channel_without_rows() {
        let data = "channel_id,channel_name\n";
        assert!(Channel::from_reader(data.as_bytes()).is_err());
    }

    #[test]
    fn test_write_csv_round_trip_header() {
        let directory = UserDirectory::from_users(vec![User::new("U1", "alice", "Alice")]);
        let mut out = Vec::new();
        directory.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "user_id,user_name,real_name\nU1,alice,Alice\n");
    }

    #[test]
    fn test_user_mention() {
        let user = User::new("U1", "alice", "Alice");
        assert_eq!(user.mention(), "<@U1|alice>");
    }
}
