//! Execution engine for the tiny BASIC interpreter
//!
//! Statements are dispatched and evaluated directly off the token stream; no
//! syntax tree is built. The executor owns the tokenizer, the variable store,
//! and the line index, and drives the main loop: skip any leading line
//! number, dispatch one statement, repeat until end of input or a fatal
//! error.
//!
//! Control flow has two deliberately distinct mechanisms, both expressed as
//! [`ControlTransfer`] requests. `GOTO` and a true `IF` rewind the tokenizer
//! and re-scan from the top for the target line. A deferred forward search
//! instead marks a pending target and lets the main loop discard statements
//! until it reaches that line, scanning strictly forward. Both pre-check the
//! line index and report the same undefined-line error for a missing target;
//! past that check, a failed re-scan is an internal error while an exhausted
//! forward search simply finishes the run.

use crate::error::{InterpreterError, Result};
use crate::program::LineIndex;
use crate::tokenizer::{Token, Tokenizer};
use crate::variables::VariableStore;
use tracing::{debug, trace, warn};

/// A request to move execution to another line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlTransfer {
    /// Rewind to the top of the source and re-scan for the target line
    ImmediateRescan(i32),
    /// Skip statements forward from the current position until the target
    /// line is reached
    DeferredForwardSearch(i32),
}

impl ControlTransfer {
    /// The requested line number
    pub fn target(&self) -> i32 {
        match *self {
            ControlTransfer::ImmediateRescan(line) => line,
            ControlTransfer::DeferredForwardSearch(line) => line,
        }
    }
}

/// Direct interpreter over a tokenized program source
#[derive(Debug)]
pub struct Executor {
    tokenizer: Tokenizer,
    variables: VariableStore,
    lines: LineIndex,
    /// Target of a deferred forward search, when one is pending
    pending_jump: Option<i32>,
    execution_finished: bool,
    // Output buffer (for testing)
    #[cfg(test)]
    output: String,
}

impl Executor {
    /// Create an executor for the given program source. All 26 variables
    /// start at 0.
    pub fn new(source: &str) -> Result<Self> {
        Ok(Self {
            tokenizer: Tokenizer::new(source)?,
            variables: VariableStore::new(),
            lines: LineIndex::new(),
            pending_jump: None,
            execution_finished: false,
            #[cfg(test)]
            output: String::new(),
        })
    }

    /// True once the program has run to completion
    pub fn finished(&self) -> bool {
        self.execution_finished
    }

    /// Current value of a variable, case-insensitive
    pub fn variable(&self, name: char) -> i32 {
        self.variables.get(name)
    }

    /// Run the program until end of input or a fatal error
    pub fn run(&mut self) -> Result<()> {
        debug!("starting program execution");
        if self.lines.is_empty() {
            self.build_line_index()?;
        }
        while !self.execution_finished {
            self.tick()?;
        }
        debug!("program execution finished");
        Ok(())
    }

    /// Run at most `max_steps` iterations of the main loop. Used to exercise
    /// looping programs without letting them run away.
    pub fn run_bounded(&mut self, max_steps: usize) -> Result<()> {
        if self.lines.is_empty() {
            self.build_line_index()?;
        }
        for _ in 0..max_steps {
            if self.execution_finished {
                break;
            }
            self.tick()?;
        }
        Ok(())
    }

    /// One iteration of the main loop: service a pending forward search, or
    /// execute the next line statement.
    fn tick(&mut self) -> Result<()> {
        if self.tokenizer.finished() {
            self.execution_finished = true;
            return Ok(());
        }
        match self.pending_jump {
            Some(target_line) => self.search_step(target_line),
            None => self.line_statement(),
        }
    }

    /// Request a control transfer. The target must be present in the line
    /// index (built first if still empty); a missing target is an
    /// undefined-line error for both variants.
    pub fn transfer(&mut self, request: ControlTransfer) -> Result<()> {
        if self.lines.is_empty() {
            self.build_line_index()?;
        }
        let target_line = request.target();
        if !self.lines.contains(target_line) {
            return Err(InterpreterError::UndefinedLine(target_line));
        }
        match request {
            ControlTransfer::ImmediateRescan(_) => self.rescan_to(target_line),
            ControlTransfer::DeferredForwardSearch(_) => {
                debug!(line = target_line, "queueing forward search");
                self.pending_jump = Some(target_line);
                Ok(())
            }
        }
    }

    /// One step of the deferred forward search: execute the statement if the
    /// target line starts here, otherwise discard the line. Exhausting the
    /// input ends the run without error via the main loop's end-of-input
    /// check.
    fn search_step(&mut self, target_line: i32) -> Result<()> {
        if self.tokenizer.number() == Some(target_line) {
            trace!(line = target_line, "forward search reached its line");
            self.pending_jump = None;
            self.tokenizer.next_token()?;
            return self.statement();
        }
        self.tokenizer.skip_to_eol()
    }

    /// Rewind and scan line-leading tokens for the target, leaving the
    /// cursor on the first token of that line's statement.
    fn rescan_to(&mut self, target_line: i32) -> Result<()> {
        debug!(line = target_line, "re-scanning from the top");
        self.tokenizer.reset()?;
        while !self.tokenizer.finished() {
            if self.tokenizer.number() == Some(target_line) {
                self.tokenizer.next_token()?;
                return Ok(());
            }
            self.tokenizer.skip_to_eol()?;
        }
        // The index said the line exists; the index heuristic and this exact
        // match are not guaranteed equivalent, so fail loudly.
        Err(InterpreterError::Internal(format!(
            "line {} is indexed but unreachable by re-scan",
            target_line
        )))
    }

    /// Scan the whole token stream for statement-leading line numbers, then
    /// rewind. Comment bodies are skipped without tokenizing, so comment text
    /// cannot mint phantom line labels.
    fn build_line_index(&mut self) -> Result<()> {
        self.lines.clear();
        self.tokenizer.reset()?;
        while !self.tokenizer.finished() {
            if *self.tokenizer.current_token() == Token::Rem {
                self.tokenizer.skip_to_eol()?;
                continue;
            }
            if let Some(value) = self.tokenizer.number() {
                if self.looks_like_line_number(value) {
                    self.lines.insert(value);
                }
            }
            self.tokenizer.next_token()?;
        }
        self.tokenizer.reset()?;
        debug!(lines = ?self.lines.iter().collect::<Vec<_>>(), "line index built");
        Ok(())
    }

    /// The shared line-number heuristic: at least 10, a multiple of 10, and
    /// followed directly by whitespace or end of input. The tokenizer cannot
    /// tell a leading line label from a numeric literal, so the index
    /// builder, the expression evaluator, and the print loop all consult
    /// this one predicate.
    fn looks_like_line_number(&self, value: i32) -> bool {
        if value < 10 || value % 10 != 0 {
            return false;
        }
        match self.tokenizer.peek_char() {
            None => true,
            Some(c) => c == ' ' || c == '\t' || c == '\n' || c == '\r',
        }
    }

    /// True when the current token is a number that passes the heuristic
    fn at_line_number(&self) -> bool {
        match self.tokenizer.number() {
            Some(value) => self.looks_like_line_number(value),
            None => false,
        }
    }

    /// Skip empty lines and a leading line number, then dispatch one
    /// statement.
    fn line_statement(&mut self) -> Result<()> {
        while *self.tokenizer.current_token() == Token::Eol {
            self.tokenizer.next_token()?;
        }
        if self.tokenizer.finished() {
            self.execution_finished = true;
            return Ok(());
        }
        if self.tokenizer.number().is_some() {
            self.tokenizer.next_token()?;
        }
        self.statement()
    }

    /// Dispatch on the statement's leading token
    fn statement(&mut self) -> Result<()> {
        let token = self.tokenizer.current_token().clone();
        debug!(statement = %token, "dispatching statement");
        match token {
            Token::Rem => self.tokenizer.skip_to_eol(),
            Token::Print => self.print_statement(),
            Token::If => self.if_statement(),
            Token::Goto => self.goto_statement(),
            Token::Let => {
                self.tokenizer.next_token()?;
                self.let_statement()
            }
            Token::Letter(_) => self.let_statement(),
            other => Err(InterpreterError::UnrecognizedStatement(other.to_string())),
        }
    }

    /// `[LET] variable = expression`. The trailing end of line is left for
    /// the main loop.
    fn let_statement(&mut self) -> Result<()> {
        let name = match self.tokenizer.letter() {
            Some(letter) => letter.to_ascii_lowercase(),
            None => {
                return Err(InterpreterError::ExpectedVariable(
                    self.tokenizer.current_token().to_string(),
                ))
            }
        };
        self.tokenizer.next_token()?;
        self.accept(Token::Equal)?;
        let value = self.expression()?;
        debug!(variable = %name, value, "assignment");
        self.variables.set(name, value);
        Ok(())
    }

    /// `IF relation THEN line`. A true condition re-scans to the target line
    /// and executes the statement found there before handing control back to
    /// the main loop; a false one falls through to the next line.
    fn if_statement(&mut self) -> Result<()> {
        self.accept(Token::If)?;
        let condition = self.relation()?;
        self.accept(Token::Then)?;
        let target_line = self.expect_number()?;
        if condition != 0 {
            debug!(line = target_line, "condition true, jumping");
            self.transfer(ControlTransfer::ImmediateRescan(target_line))?;
            self.statement()
        } else {
            if *self.tokenizer.current_token() == Token::Eol {
                self.tokenizer.next_token()?;
            }
            Ok(())
        }
    }

    /// `GOTO line`, terminated by end of line
    fn goto_statement(&mut self) -> Result<()> {
        self.accept(Token::Goto)?;
        let target_line = self.expect_number()?;
        self.accept(Token::Eol)?;
        self.transfer(ControlTransfer::ImmediateRescan(target_line))
    }

    /// `PRINT` with any mix of strings, separators, and expressions.
    /// Printed items after the first get a single space in front unless a
    /// separator already supplied one; the newline is unconditional.
    fn print_statement(&mut self) -> Result<()> {
        self.accept(Token::Print)?;
        let mut need_space = false;
        while !self.tokenizer.finished() {
            let token = self.tokenizer.current_token().clone();
            if matches!(token, Token::Eol | Token::Eof) {
                break;
            }
            if self.at_line_number() {
                break;
            }
            match token {
                Token::String(text) => {
                    if need_space {
                        self.print_output(" ");
                    }
                    self.print_output(&text);
                    need_space = true;
                    self.tokenizer.next_token()?;
                }
                Token::Separator => {
                    need_space = false;
                    self.print_output(" ");
                    self.tokenizer.next_token()?;
                }
                Token::Letter(_) | Token::Number(_) | Token::LeftParen => {
                    if need_space {
                        self.print_output(" ");
                    }
                    let value = self.expression()?;
                    self.print_output(&value.to_string());
                    need_space = true;
                }
                _ => break,
            }
        }
        self.print_output("\n");
        if self.at_line_number() {
            // Leave the next statement's line number for the main loop
            return Ok(());
        }
        if self.tokenizer.finished() {
            self.execution_finished = true;
        } else if *self.tokenizer.current_token() == Token::Eol {
            self.tokenizer.next_token()?;
        }
        Ok(())
    }

    /// `relation := expression [ relop expression ]`. With a comparison
    /// operator the result is 1 or 0; without one, any non-zero value counts
    /// as true.
    fn relation(&mut self) -> Result<i32> {
        let left = self.expression()?;
        let op = match self.tokenizer.current_token() {
            Token::Equal
            | Token::NotEqual
            | Token::Lt
            | Token::Gt
            | Token::LtEq
            | Token::GtEq => self.tokenizer.current_token().clone(),
            _ => return Ok(i32::from(left != 0)),
        };
        self.tokenizer.next_token()?;
        let right = self.expression()?;
        let truth = match op {
            Token::Equal => left == right,
            Token::NotEqual => left != right,
            Token::Lt => left < right,
            Token::Gt => left > right,
            Token::LtEq => left <= right,
            Token::GtEq => left >= right,
            _ => {
                return Err(InterpreterError::Internal(
                    "invalid comparison operator".to_string(),
                ))
            }
        };
        Ok(i32::from(truth))
    }

    /// `expression := term { ('+'|'-') term }`, with the early stop for a
    /// trailing numeric literal that scans as the next statement's line
    /// label.
    fn expression(&mut self) -> Result<i32> {
        let mut result = self.term()?;
        if self.at_line_number() {
            trace!(value = result, "expression stops before a line label");
            return Ok(result);
        }
        loop {
            let op = match self.tokenizer.current_token() {
                Token::Plus | Token::Minus => self.tokenizer.current_token().clone(),
                _ => break,
            };
            self.tokenizer.next_token()?;
            let rhs = self.term()?;
            result = match op {
                Token::Plus => result.wrapping_add(rhs),
                _ => result.wrapping_sub(rhs),
            };
        }
        Ok(result)
    }

    /// `term := factor { ('*'|'/') factor }`
    fn term(&mut self) -> Result<i32> {
        let mut result = self.factor()?;
        loop {
            let op = match self.tokenizer.current_token() {
                Token::Asterisk | Token::Slash => self.tokenizer.current_token().clone(),
                _ => break,
            };
            self.tokenizer.next_token()?;
            let rhs = self.factor()?;
            result = match op {
                Token::Asterisk => result.wrapping_mul(rhs),
                _ => self.safe_divide(result, rhs),
            };
        }
        Ok(result)
    }

    /// `factor := NUMBER | LETTER | '(' expression ')'`
    fn factor(&mut self) -> Result<i32> {
        let token = self.tokenizer.current_token().clone();
        match token {
            Token::Number(value) => {
                trace!(value, "factor literal");
                self.tokenizer.next_token()?;
                Ok(value)
            }
            Token::Letter(name) => {
                let value = self.variables.get(name);
                trace!(variable = %name, value, "factor variable");
                self.tokenizer.next_token()?;
                Ok(value)
            }
            Token::LeftParen => {
                self.tokenizer.next_token()?;
                let value = self.expression()?;
                self.accept(Token::RightParen)?;
                Ok(value)
            }
            other => Err(InterpreterError::UnexpectedFactor(other.to_string())),
        }
    }

    /// Division with the divide-by-zero warning: the result is 0 and the run
    /// continues.
    fn safe_divide(&self, numerator: i32, denominator: i32) -> i32 {
        if denominator == 0 {
            warn!("divide by zero");
            eprintln!("WARNING: divide by zero");
            return 0;
        }
        numerator.wrapping_div(denominator)
    }

    /// Require the current token's kind and advance past it
    fn accept(&mut self, expected: Token) -> Result<()> {
        if std::mem::discriminant(self.tokenizer.current_token())
            != std::mem::discriminant(&expected)
        {
            return Err(InterpreterError::UnexpectedToken {
                found: self.tokenizer.current_token().to_string(),
                expected: expected.to_string(),
            });
        }
        self.tokenizer.next_token()
    }

    /// Require a literal number and advance past it
    fn expect_number(&mut self) -> Result<i32> {
        match self.tokenizer.number() {
            Some(value) => {
                self.tokenizer.next_token()?;
                Ok(value)
            }
            None => Err(InterpreterError::UnexpectedToken {
                found: self.tokenizer.current_token().to_string(),
                expected: "number".to_string(),
            }),
        }
    }

    /// Print output (to buffer in test mode, to stdout in production)
    fn print_output(&mut self, text: &str) {
        #[cfg(test)]
        {
            self.output.push_str(text);
        }
        #[cfg(not(test))]
        {
            print!("{}", text);
        }
    }

    /// Get output buffer (for testing)
    #[cfg(test)]
    pub fn output(&self) -> &str {
        &self.output
    }
}
