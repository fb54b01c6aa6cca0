//! Typed binding commands.
//!
//! A [`ProxyRequest`] names its operation by string; a [`ProxyCommand`] is
//! the same call decoded into the closed set of operations each binding
//! supports. Remote bindings build commands and lower them with
//! [`ProxyCommand::into_request`]; handlers raise requests back with
//! [`ProxyCommand::from_request`]. Wire layouts for positional arguments:
//!
//! | binding.method     | args                          |
//! |--------------------|-------------------------------|
//! | database.all/first/run | `[sql, bindArgs]`         |
//! | database.batch     | `[[{sql, args}, ...]]`        |
//! | database.exec      | `[sql]`                       |
//! | database.dump      | `[]`                          |
//! | kv.get/delete      | `[key]`                       |
//! | kv.put             | `[key, value, options?]`      |
//! | kv.list            | `[options?]`                  |
//! | blob.get/delete/head | `[key]`                     |
//! | blob.put           | `[key, payload, options?]`    |
//! | blob.list          | `[options?]`                  |

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use openhub_bindings::{BlobListOptions, BlobPutOptions, KvListOptions, KvPutOptions, StatementSpec};
use openhub_common::{BindingKind, Error, Result};

use crate::encoding::BlobPayload;
use crate::protocol::ProxyRequest;

#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseCommand {
    All(StatementSpec),
    First(StatementSpec),
    Run(StatementSpec),
    Batch(Vec<StatementSpec>),
    Exec(String),
    Dump,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KvCommand {
    Get {
        key: String,
    },
    Put {
        key: String,
        value: String,
        options: Option<KvPutOptions>,
    },
    Delete {
        key: String,
    },
    List {
        options: Option<KvListOptions>,
    },
    /// Provider-specific method forwarded untouched.
    Call {
        method: String,
        args: Vec<Value>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlobCommand {
    Get {
        key: String,
    },
    Put {
        key: String,
        payload: BlobPayload,
        options: Option<BlobPutOptions>,
    },
    Delete {
        key: String,
    },
    List {
        options: Option<BlobListOptions>,
    },
    Head {
        key: String,
    },
    /// Provider-specific method forwarded untouched.
    Call {
        method: String,
        args: Vec<Value>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProxyCommand {
    Database(DatabaseCommand),
    Kv(KvCommand),
    Blob(BlobCommand),
}

impl ProxyCommand {
    pub fn binding(&self) -> BindingKind {
        match self {
            ProxyCommand::Database(_) => BindingKind::Database,
            ProxyCommand::Kv(_) => BindingKind::Kv,
            ProxyCommand::Blob(_) => BindingKind::Blob,
        }
    }

    /// Decode a request.
    ///
    /// Unknown database methods are rejected with [`Error::MethodNotFound`];
    /// unknown kv and blob methods become `Call` so providers can expose
    /// extras.
    pub fn from_request(request: ProxyRequest) -> Result<Self> {
        let ProxyRequest {
            binding,
            method,
            args,
        } = request;
        let args = Args {
            binding,
            method: &method,
            values: &args,
        };

        let command = match binding {
            BindingKind::Database => ProxyCommand::Database(match method.as_str() {
                "all" => DatabaseCommand::All(args.statement()?),
                "first" => DatabaseCommand::First(args.statement()?),
                "run" => DatabaseCommand::Run(args.statement()?),
                "batch" => DatabaseCommand::Batch(args.required(0, "statements")?),
                "exec" => DatabaseCommand::Exec(args.string(0, "sql")?),
                "dump" => DatabaseCommand::Dump,
                _ => {
                    return Err(Error::MethodNotFound {
                        binding,
                        method: method.clone(),
                    })
                }
            }),
            BindingKind::Kv => ProxyCommand::Kv(match method.as_str() {
                "get" => KvCommand::Get {
                    key: args.string(0, "key")?,
                },
                "put" => KvCommand::Put {
                    key: args.string(0, "key")?,
                    value: args.string(1, "value")?,
                    options: args.optional(2, "options")?,
                },
                "delete" => KvCommand::Delete {
                    key: args.string(0, "key")?,
                },
                "list" => KvCommand::List {
                    options: args.optional(0, "options")?,
                },
                _ => KvCommand::Call {
                    args: args.values.to_vec(),
                    method,
                },
            }),
            BindingKind::Blob => ProxyCommand::Blob(match method.as_str() {
                "get" => BlobCommand::Get {
                    key: args.string(0, "key")?,
                },
                "put" => BlobCommand::Put {
                    key: args.string(0, "key")?,
                    payload: BlobPayload::from_value(args.value(1, "payload")?),
                    options: args.optional(2, "options")?,
                },
                "delete" => BlobCommand::Delete {
                    key: args.string(0, "key")?,
                },
                "list" => BlobCommand::List {
                    options: args.optional(0, "options")?,
                },
                "head" => BlobCommand::Head {
                    key: args.string(0, "key")?,
                },
                _ => BlobCommand::Call {
                    args: args.values.to_vec(),
                    method,
                },
            }),
        };
        Ok(command)
    }

    /// Lower into the wire request.
    pub fn into_request(self) -> ProxyRequest {
        match self {
            ProxyCommand::Database(command) => match command {
                DatabaseCommand::All(spec) => statement_request("all", spec),
                DatabaseCommand::First(spec) => statement_request("first", spec),
                DatabaseCommand::Run(spec) => statement_request("run", spec),
                DatabaseCommand::Batch(specs) => {
                    ProxyRequest::new(BindingKind::Database, "batch", vec![to_json(&specs)])
                }
                DatabaseCommand::Exec(sql) => {
                    ProxyRequest::new(BindingKind::Database, "exec", vec![Value::String(sql)])
                }
                DatabaseCommand::Dump => ProxyRequest::new(BindingKind::Database, "dump", vec![]),
            },
            ProxyCommand::Kv(command) => match command {
                KvCommand::Get { key } => ProxyRequest::new(BindingKind::Kv, "get", vec![key.into()]),
                KvCommand::Put {
                    key,
                    value,
                    options,
                } => ProxyRequest::new(
                    BindingKind::Kv,
                    "put",
                    vec![key.into(), value.into(), to_json(&options)],
                ),
                KvCommand::Delete { key } => {
                    ProxyRequest::new(BindingKind::Kv, "delete", vec![key.into()])
                }
                KvCommand::List { options } => {
                    ProxyRequest::new(BindingKind::Kv, "list", vec![to_json(&options)])
                }
                KvCommand::Call { method, args } => ProxyRequest::new(BindingKind::Kv, method, args),
            },
            ProxyCommand::Blob(command) => match command {
                BlobCommand::Get { key } => {
                    ProxyRequest::new(BindingKind::Blob, "get", vec![key.into()])
                }
                BlobCommand::Put {
                    key,
                    payload,
                    options,
                } => ProxyRequest::new(
                    BindingKind::Blob,
                    "put",
                    vec![key.into(), payload.to_value(), to_json(&options)],
                ),
                BlobCommand::Delete { key } => {
                    ProxyRequest::new(BindingKind::Blob, "delete", vec![key.into()])
                }
                BlobCommand::List { options } => {
                    ProxyRequest::new(BindingKind::Blob, "list", vec![to_json(&options)])
                }
                BlobCommand::Head { key } => {
                    ProxyRequest::new(BindingKind::Blob, "head", vec![key.into()])
                }
                BlobCommand::Call { method, args } => {
                    ProxyRequest::new(BindingKind::Blob, method, args)
                }
            },
        }
    }
}

fn statement_request(method: &str, spec: StatementSpec) -> ProxyRequest {
    ProxyRequest::new(
        BindingKind::Database,
        method,
        vec![Value::String(spec.sql), Value::Array(spec.args)],
    )
}

// Option payloads are plain data structs; serializing them cannot fail.
fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Positional argument reader with uniform error messages.
struct Args<'a> {
    binding: BindingKind,
    method: &'a str,
    values: &'a [Value],
}

impl Args<'_> {
    fn invalid(&self, index: usize, name: &str, problem: &str) -> Error {
        Error::InvalidInput(format!(
            "Argument {} ({}) of {}.{} {}",
            index, name, self.binding, self.method, problem
        ))
    }

    fn value(&self, index: usize, name: &str) -> Result<Value> {
        match self.values.get(index) {
            Some(Value::Null) | None => Err(self.invalid(index, name, "is missing")),
            Some(value) => Ok(value.clone()),
        }
    }

    fn string(&self, index: usize, name: &str) -> Result<String> {
        match self.values.get(index) {
            Some(Value::String(text)) => Ok(text.clone()),
            Some(Value::Null) | None => Err(self.invalid(index, name, "is missing")),
            Some(_) => Err(self.invalid(index, name, "must be a string")),
        }
    }

    fn required<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<T> {
        let value = self.value(index, name)?;
        serde_json::from_value(value)
            .map_err(|e| self.invalid(index, name, &format!("is malformed: {}", e)))
    }

    fn optional<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<Option<T>> {
        match self.values.get(index) {
            Some(Value::Null) | None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| self.invalid(index, name, &format!("is malformed: {}", e))),
        }
    }

    /// `[sql, bindArgs]`, with absent bind arguments meaning none.
    fn statement(&self) -> Result<StatementSpec> {
        let sql = self.string(0, "sql")?;
        let params: Option<Vec<Value>> = self.optional(1, "bindArgs")?;
        Ok(StatementSpec::new(sql, params.unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::EncodedBlob;
    use serde_json::json;

    fn decode(binding: BindingKind, method: &str, args: Vec<Value>) -> Result<ProxyCommand> {
        ProxyCommand::from_request(ProxyRequest::new(binding, method, args))
    }

    #[test]
    fn test_kv_put_without_options_sends_null() {
        let request = ProxyCommand::Kv(KvCommand::Put {
            key: "k".to_string(),
            value: "v".to_string(),
            options: None,
        })
        .into_request();

        assert_eq!(request.method, "put");
        assert_eq!(request.args, vec![json!("k"), json!("v"), Value::Null]);
    }

    #[test]
    fn test_statement_layout() {
        let request = ProxyCommand::Database(DatabaseCommand::All(StatementSpec::new(
            "SELECT * FROM users WHERE id = ?",
            vec![json!(5)],
        )))
        .into_request();

        assert_eq!(
            request.args,
            vec![json!("SELECT * FROM users WHERE id = ?"), json!([5])]
        );
    }

    #[test]
    fn test_batch_layout() {
        let request = ProxyCommand::Database(DatabaseCommand::Batch(vec![
            StatementSpec::new("INSERT INTO t VALUES (?)", vec![json!(1)]),
            StatementSpec::new("DELETE FROM t", vec![]),
        ]))
        .into_request();

        assert_eq!(
            request.args,
            vec![json!([
                {"sql": "INSERT INTO t VALUES (?)", "args": [1]},
                {"sql": "DELETE FROM t", "args": []}
            ])]
        );
    }

    #[test]
    fn test_statement_without_bind_args() {
        let command = decode(BindingKind::Database, "first", vec![json!("SELECT 1")]).unwrap();
        assert_eq!(
            command,
            ProxyCommand::Database(DatabaseCommand::First(StatementSpec::new("SELECT 1", vec![])))
        );
    }

    #[test]
    fn test_unknown_database_method() {
        let err = decode(BindingKind::Database, "explode", vec![]).unwrap_err();
        assert_eq!(err.to_string(), "Method 'explode' not found on binding 'database'");
    }

    #[test]
    fn test_unknown_kv_method_becomes_call() {
        let command = decode(BindingKind::Kv, "getWithMetadata", vec![json!("k")]).unwrap();
        assert_eq!(
            command,
            ProxyCommand::Kv(KvCommand::Call {
                method: "getWithMetadata".to_string(),
                args: vec![json!("k")],
            })
        );
    }

    #[test]
    fn test_missing_key_is_invalid_input() {
        let err = decode(BindingKind::Kv, "get", vec![]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(
            err.to_string(),
            "Invalid input: Argument 0 (key) of kv.get is missing"
        );
    }

    #[test]
    fn test_blob_put_decodes_payload() {
        let command = decode(
            BindingKind::Blob,
            "put",
            vec![
                json!("file.txt"),
                json!({"base64": "aGVsbG8=", "contentType": "text/plain"}),
            ],
        )
        .unwrap();

        assert_eq!(
            command,
            ProxyCommand::Blob(BlobCommand::Put {
                key: "file.txt".to_string(),
                payload: BlobPayload::Encoded(EncodedBlob {
                    base64: "aGVsbG8=".to_string(),
                    content_type: Some("text/plain".to_string()),
                }),
                options: None,
            })
        );
    }

    #[test]
    fn test_kv_list_options_parsed() {
        let command = decode(BindingKind::Kv, "list", vec![json!({"prefix": "user:", "limit": 2})])
            .unwrap();
        assert_eq!(
            command,
            ProxyCommand::Kv(KvCommand::List {
                options: Some(KvListOptions {
                    prefix: Some("user:".to_string()),
                    limit: Some(2),
                    cursor: None,
                }),
            })
        );
    }

    #[test]
    fn test_lowered_requests_decode_back() {
        let commands = vec![
            ProxyCommand::Database(DatabaseCommand::Exec("VACUUM".to_string())),
            ProxyCommand::Database(DatabaseCommand::Dump),
            ProxyCommand::Kv(KvCommand::Delete {
                key: "k".to_string(),
            }),
            ProxyCommand::Blob(BlobCommand::Head {
                key: "a.png".to_string(),
            }),
        ];
        for command in commands {
            let back = ProxyCommand::from_request(command.clone().into_request()).unwrap();
            assert_eq!(back, command);
        }
    }
}
