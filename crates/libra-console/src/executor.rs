//! Executes parsed commands against an embedded database, one transaction
//! per command.

use libra_core::api::Db;

use crate::parser::{Command, HELP};

pub struct Executor {
    db: Db,
}

/// What a command produced: a line to print, or a request to leave.
pub enum Outcome {
    Output(String),
    Exit,
}

impl Executor {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn execute(&self, command: Command) -> Result<Outcome, String> {
        match command {
            Command::Help => Ok(Outcome::Output(HELP.to_string())),
            Command::Exit => Ok(Outcome::Exit),

            Command::Create { collection } => {
                let mut tx = self.db.write_tx();
                tx.create_collection(collection.as_bytes())
                    .map_err(|e| e.to_string())?;
                tx.commit().map_err(|e| e.to_string())?;
                Ok(Outcome::Output("ok".to_string()))
            }

            Command::Drop { collection } => {
                let mut tx = self.db.write_tx();
                tx.delete_collection(collection.as_bytes())
                    .map_err(|e| e.to_string())?;
                tx.commit().map_err(|e| e.to_string())?;
                Ok(Outcome::Output("ok".to_string()))
            }

            Command::Put {
                collection,
                key,
                value,
            } => {
                let mut tx = self.db.write_tx();
                let Some(mut collection) = tx
                    .get_collection(collection.as_bytes())
                    .map_err(|e| e.to_string())?
                else {
                    return Err(format!("no such collection: {collection}"));
                };
                collection
                    .put(&mut tx, key.as_bytes(), value.as_bytes())
                    .map_err(|e| e.to_string())?;
                tx.commit().map_err(|e| e.to_string())?;
                Ok(Outcome::Output("ok".to_string()))
            }

            Command::Get { collection, key } => {
                let tx = self.db.read_tx();
                let Some(collection) = tx
                    .get_collection(collection.as_bytes())
                    .map_err(|e| e.to_string())?
                else {
                    return Err(format!("no such collection: {collection}"));
                };
                let item = collection
                    .find(&tx, key.as_bytes())
                    .map_err(|e| e.to_string())?;
                tx.commit().map_err(|e| e.to_string())?;
                match item {
                    Some(item) => Ok(Outcome::Output(
                        String::from_utf8_lossy(&item.value).into_owned(),
                    )),
                    None => Ok(Outcome::Output("(not found)".to_string())),
                }
            }

            Command::Del { collection, key } => {
                let mut tx = self.db.write_tx();
                let Some(mut collection) = tx
                    .get_collection(collection.as_bytes())
                    .map_err(|e| e.to_string())?
                else {
                    return Err(format!("no such collection: {collection}"));
                };
                collection
                    .remove(&mut tx, key.as_bytes())
                    .map_err(|e| e.to_string())?;
                tx.commit().map_err(|e| e.to_string())?;
                Ok(Outcome::Output("ok".to_string()))
            }
        }
    }
}
