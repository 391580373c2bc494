//! Transactional SQL batch execution
//!
//! Runs one opaque SQL batch inside a transaction: begin, submit the batch,
//! then commit on success or roll back on failure. The driver sits behind the
//! [`TransactionHandle`] trait so the state machine can be exercised without a
//! server. The server may abort the transaction on its own while the batch is
//! outstanding; the rolled-back check before an explicit rollback is what
//! keeps the terminal transition single-shot.

use futures_util::TryStreamExt;
use tiberius::{AuthMethod, Client, Config, QueryItem};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::connection::ConnectionParameters;
use crate::error::DeployError;

/// Connection timeout, fixed configuration (not tunable per call)
pub const CONNECT_TIMEOUT_SECS: u64 = 100;

const BEGIN_SQL: &str = "BEGIN TRANSACTION";
const COMMIT_SQL: &str = "COMMIT TRANSACTION";
const ROLLBACK_SQL: &str = "ROLLBACK TRANSACTION";
const XACT_STATE_SQL: &str = "SELECT XACT_STATE()";

type TdsClient = Client<Compat<TcpStream>>;

/// Lifecycle of a single transactional execution
///
/// Transitions are monotonic; `RolledBack` and `Committed` are terminal and
/// reached at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    NotStarted,
    Active,
    RolledBack,
    Committed,
}

impl TransactionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionState::RolledBack | TransactionState::Committed)
    }
}

/// Outcome of a committed execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub state: TransactionState,
    pub rows_affected: u64,
}

/// Driver seam for the transactional state machine
///
/// `already_rolled_back` reports whether the server has aborted the
/// transaction on its own (the driver-level rollback notification); it is
/// consulted after a failed batch, before any explicit rollback is issued.
#[allow(async_fn_in_trait)]
pub trait TransactionHandle {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn begin(&mut self) -> Result<(), Self::Error>;
    async fn run_batch(&mut self, sql: &str) -> Result<u64, Self::Error>;
    async fn already_rolled_back(&mut self) -> bool;
    async fn commit(&mut self) -> Result<(), Self::Error>;
    async fn rollback(&mut self) -> Result<(), Self::Error>;
}

/// Run one SQL batch transactionally.
///
/// Begin failure is fatal with nothing to roll back. A failed batch triggers
/// at most one explicit rollback; if the server already rolled the
/// transaction back, none. The batch error is always the one surfaced, with
/// any rollback failure attached rather than masking it. No step is retried.
pub async fn run_transaction<T: TransactionHandle>(
    handle: &mut T,
    sql: &str,
) -> Result<ExecutionSummary, DeployError> {
    handle
        .begin()
        .await
        .map_err(|source| DeployError::BeginTransactionError {
            source: Box::new(source),
        })?;

    match handle.run_batch(sql).await {
        Ok(rows_affected) => {
            handle.commit().await.map_err(|source| DeployError::CommitError {
                source: Box::new(source),
            })?;
            Ok(ExecutionSummary {
                state: TransactionState::Committed,
                rows_affected,
            })
        }
        Err(batch_error) => {
            // The server may have aborted the transaction already; checking
            // first avoids issuing a second rollback.
            let rollback_error = if handle.already_rolled_back().await {
                None
            } else {
                handle.rollback().await.err()
            };
            Err(DeployError::BatchError {
                source: Box::new(batch_error),
                rollback_error: rollback_error
                    .map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
            })
        }
    }
}

/// Tiberius-backed transaction over a single connection
pub struct TdsTransaction {
    client: TdsClient,
}

impl TdsTransaction {
    /// Open a connection for the given target.
    ///
    /// `server_name` is the effective server (override already applied) and
    /// may embed a `,port` suffix; credentials and database come from the
    /// parsed connection string.
    pub async fn connect(
        server_name: &str,
        connection: &ConnectionParameters,
    ) -> Result<Self, DeployError> {
        let (host, port) = if server_name.contains(',') {
            crate::connection::split_server_address(server_name)?
        } else {
            (server_name.to_string(), connection.port)
        };

        let mut config = Config::new();
        config.host(&host);
        config.port(port);
        if !connection.database.is_empty() {
            config.database(&connection.database);
        }
        config.authentication(AuthMethod::sql_server(
            &connection.user_id,
            &connection.password,
        ));
        config.trust_cert();

        let connect = async {
            let tcp = TcpStream::connect(config.get_addr())
                .await
                .map_err(tiberius::error::Error::from)?;
            tcp.set_nodelay(true).map_err(tiberius::error::Error::from)?;
            Client::connect(config, tcp.compat_write()).await
        };

        let timeout = std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS);
        let client = match tokio::time::timeout(timeout, connect).await {
            Ok(Ok(client)) => client,
            Ok(Err(source)) => {
                return Err(DeployError::ConnectError {
                    server: host,
                    port,
                    source,
                })
            }
            Err(_) => {
                return Err(DeployError::ConnectTimeout {
                    server: host,
                    port,
                    timeout_secs: CONNECT_TIMEOUT_SECS,
                })
            }
        };

        Ok(TdsTransaction { client })
    }

    async fn run_simple(&mut self, sql: &str) -> Result<(), tiberius::error::Error> {
        let mut stream = self.client.simple_query(sql).await?;
        while stream.try_next().await?.is_some() {}
        Ok(())
    }
}

impl TransactionHandle for TdsTransaction {
    type Error = tiberius::error::Error;

    async fn begin(&mut self) -> Result<(), Self::Error> {
        self.run_simple(BEGIN_SQL).await
    }

    async fn run_batch(&mut self, sql: &str) -> Result<u64, Self::Error> {
        // One opaque batch; no statement splitting and no GO handling.
        let result = self.client.execute(sql, &[]).await?;
        Ok(result.rows_affected().iter().sum())
    }

    async fn already_rolled_back(&mut self) -> bool {
        // XACT_STATE() = 0 means no open transaction: the server rolled it
        // back on its own. If the probe itself fails the connection is gone
        // and an explicit rollback could not be delivered either.
        let mut stream = match self.client.simple_query(XACT_STATE_SQL).await {
            Ok(stream) => stream,
            Err(_) => return true,
        };

        let mut xact_state: Option<i16> = None;
        loop {
            match stream.try_next().await {
                Ok(Some(QueryItem::Row(row))) => {
                    xact_state = row.get::<i16, usize>(0);
                }
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(_) => return true,
            }
        }

        xact_state == Some(0)
    }

    async fn commit(&mut self) -> Result<(), Self::Error> {
        self.run_simple(COMMIT_SQL).await
    }

    async fn rollback(&mut self) -> Result<(), Self::Error> {
        self.run_simple(ROLLBACK_SQL).await
    }
}
