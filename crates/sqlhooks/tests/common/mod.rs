//! In-memory driver shared by the integration tests.
//!
//! Understands just enough SQL to tell reads from writes: `SELECT ...`
//! returns one row echoing its arguments, `INSERT`/`UPDATE`/`DELETE`/`CREATE`
//! affect one row, anything else fails with a driver "syntax error".

#![allow(dead_code)]

use sqlhooks::{
    Capabilities, Connection, Context, DbError, DbResult, Driver, ExecResult, NamedValue, Rows,
    Statement, StatementCapabilities, Transaction, Value, named_to_positional,
};
use std::sync::{Arc, Mutex};

/// One call that reached the mock driver.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub op: &'static str,
    pub query: String,
    pub args: Vec<Value>,
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

#[derive(Debug, Clone)]
pub struct MockDriver {
    caps: Capabilities,
    log: CallLog,
}

impl MockDriver {
    pub fn new(caps: Capabilities) -> Self {
        Self {
            caps,
            log: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().clone()
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl Driver for MockDriver {
    type Conn = MockConn;

    async fn open(&self, dsn: &str) -> DbResult<MockConn> {
        if dsn.is_empty() {
            return Err(DbError::driver_msg("empty dsn"));
        }
        Ok(MockConn {
            caps: self.caps,
            log: self.log.clone(),
        })
    }
}

fn record(log: &CallLog, op: &'static str, query: &str, args: &[Value]) {
    log.lock().unwrap().push(Call {
        op,
        query: query.to_string(),
        args: args.to_vec(),
    });
}

fn run_exec(query: &str) -> DbResult<ExecResult> {
    let verb = first_word(query);
    match verb.as_str() {
        "INSERT" => Ok(ExecResult::new(1).with_last_insert_id(1)),
        "UPDATE" | "DELETE" | "CREATE" => Ok(ExecResult::new(1)),
        "SELECT" => Ok(ExecResult::new(0)),
        _ => Err(DbError::driver_msg(format!(
            "syntax error at or near \"{verb}\""
        ))),
    }
}

fn run_query(query: &str, args: &[Value]) -> DbResult<MockRows> {
    if first_word(query) != "SELECT" {
        return Err(DbError::driver_msg(format!(
            "syntax error at or near \"{}\"",
            first_word(query)
        )));
    }
    let columns = (1..=args.len().max(1)).map(|i| format!("c{i}")).collect();
    let row = if args.is_empty() {
        vec![Value::Int(1)]
    } else {
        args.to_vec()
    };
    Ok(MockRows {
        columns,
        rows: vec![row],
    })
}

fn first_word(query: &str) -> String {
    query
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase()
}

#[derive(Debug)]
pub struct MockConn {
    caps: Capabilities,
    log: CallLog,
}

impl Connection for MockConn {
    type Stmt = MockStmt;
    type Rows = MockRows;
    type Tx = MockTx;

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    async fn prepare(&self, query: &str) -> DbResult<MockStmt> {
        record(&self.log, "prepare", query, &[]);
        Ok(MockStmt {
            query: query.to_string(),
            log: self.log.clone(),
        })
    }

    async fn execute(&self, query: &str, args: &[Value]) -> DbResult<ExecResult> {
        record(&self.log, "execute", query, args);
        run_exec(query)
    }

    async fn query(&self, query: &str, args: &[Value]) -> DbResult<MockRows> {
        record(&self.log, "query", query, args);
        run_query(query, args)
    }

    async fn execute_context(
        &self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> DbResult<ExecResult> {
        let values = named_to_positional(args)?;
        record(&self.log, "execute_context", query, &values);
        ctx.guard(async { run_exec(query) }).await
    }

    async fn query_context(
        &self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> DbResult<MockRows> {
        let values = named_to_positional(args)?;
        record(&self.log, "query_context", query, &values);
        ctx.guard(async { run_query(query, &values) }).await
    }

    async fn begin(&self) -> DbResult<MockTx> {
        record(&self.log, "begin", "", &[]);
        Ok(MockTx {
            log: self.log.clone(),
        })
    }

    async fn ping(&self, ctx: &Context) -> DbResult<()> {
        match ctx.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn close(&self) -> DbResult<()> {
        record(&self.log, "close", "", &[]);
        Ok(())
    }
}

#[derive(Debug)]
pub struct MockStmt {
    query: String,
    log: CallLog,
}

impl Statement for MockStmt {
    type Rows = MockRows;

    fn capabilities(&self) -> StatementCapabilities {
        StatementCapabilities::default()
    }

    fn num_input(&self) -> Option<usize> {
        None
    }

    async fn execute(&self, args: &[Value]) -> DbResult<ExecResult> {
        record(&self.log, "stmt.execute", &self.query, args);
        run_exec(&self.query)
    }

    async fn query(&self, args: &[Value]) -> DbResult<MockRows> {
        record(&self.log, "stmt.query", &self.query, args);
        run_query(&self.query, args)
    }

    async fn close(&self) -> DbResult<()> {
        Ok(())
    }
}

#[derive(Debug)]
pub struct MockRows {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Rows for MockRows {
    fn columns(&self) -> Vec<String> {
        self.columns.clone()
    }

    async fn next(&mut self) -> DbResult<Option<Vec<Value>>> {
        if self.rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.rows.remove(0)))
    }

    async fn close(&mut self) -> DbResult<()> {
        self.rows.clear();
        Ok(())
    }
}

#[derive(Debug)]
pub struct MockTx {
    log: CallLog,
}

impl Transaction for MockTx {
    async fn commit(self) -> DbResult<()> {
        record(&self.log, "commit", "", &[]);
        Ok(())
    }

    async fn rollback(self) -> DbResult<()> {
        record(&self.log, "rollback", "", &[]);
        Ok(())
    }
}
