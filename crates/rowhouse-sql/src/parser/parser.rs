//! Recursive-descent SQL parser.

use super::error::ParseError;
use super::pratt::{
    infix_binding_power, token_to_binary_op, NOT_BP, SIGN_BP, TERNARY_RIGHT_BP,
};
use crate::ast::{
    Assignment, ColumnDef, CreateTableStatement, CteDefinition, DataType, DeleteStatement,
    DropTableStatement, Expr, FrameBound, FrameUnits, FunctionCall, InList, InsertSource,
    InsertStatement, JoinKind, Literal, NullOrdering, OrderByExpr, OrderDirection,
    SelectStatement, SetOperator, Statement, TableRef, TypeArg, UnaryOp, UpdateStatement,
    WindowFrame, WindowSpec,
};
use crate::lexer::{Keyword, Lexer, Token, TokenKind};

/// Keywords that may head a function call (`if(...)`, `left(...)`, …)
/// or otherwise act as plain identifiers in expression position.
const IDENT_KEYWORDS: &[(Keyword, &str)] = &[
    (Keyword::If, "if"),
    (Keyword::Left, "left"),
    (Keyword::Right, "right"),
    (Keyword::Any, "any"),
    (Keyword::Array, "array"),
    (Keyword::Tuple, "tuple"),
    (Keyword::Map, "map"),
];

/// SQL parser over a pre-lexed token vector.
///
/// The full input is tokenized up front; lambda detection and other
/// multi-token lookahead save and restore the position index.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Counter for `?` placeholders (1-based positions).
    param_counter: usize,
}

impl Parser {
    /// Creates a new parser for the given input.
    #[must_use]
    pub fn new(input: &str) -> Self {
        let tokens = Lexer::new(input).tokenize();
        Self {
            tokens,
            pos: 0,
            param_counter: 0,
        }
    }

    /// Parses a single SQL statement, including any trailing set-operation
    /// chain (`UNION` / `INTERSECT` / `EXCEPT`, left-associative).
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when the input is not a valid statement.
    pub fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let mut stmt = self.parse_statement_operand()?;

        loop {
            let op = match self.current().as_keyword() {
                Some(Keyword::Union) => SetOperator::Union,
                Some(Keyword::Intersect) => SetOperator::Intersect,
                Some(Keyword::Except) => SetOperator::Except,
                _ => break,
            };
            self.advance();

            let all = if self.check_keyword(Keyword::All) {
                self.advance();
                true
            } else {
                if self.check_keyword(Keyword::Distinct) {
                    self.advance();
                }
                false
            };

            let right = self.parse_statement_operand()?;
            stmt = Statement::SetOperation {
                op,
                all,
                left: Box::new(stmt),
                right: Box::new(right),
            };
        }

        Ok(stmt)
    }

    /// Consumes trailing semicolons and expects the end of input.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when unconsumed tokens remain.
    pub fn expect_end(&mut self) -> Result<(), ParseError> {
        while self.check(&TokenKind::Semicolon) {
            self.advance();
        }
        if self.current().is_eof() {
            Ok(())
        } else {
            Err(self.unexpected("end of statement"))
        }
    }

    /// Parses one statement without the set-operation loop.
    fn parse_statement_operand(&mut self) -> Result<Statement, ParseError> {
        match &self.current().kind {
            TokenKind::Keyword(Keyword::With) => self.parse_with_select(),
            TokenKind::Keyword(Keyword::Select) => {
                let select = self.parse_select_statement(Vec::new())?;
                Ok(Statement::Select(Box::new(select)))
            }
            TokenKind::Keyword(Keyword::Insert) => self.parse_insert_statement(),
            TokenKind::Keyword(Keyword::Create) => self.parse_create_table(),
            TokenKind::Keyword(Keyword::Drop) => self.parse_drop_table(),
            TokenKind::Keyword(Keyword::Update) => self.parse_update_statement(),
            TokenKind::Keyword(Keyword::Delete) => self.parse_delete_statement(),
            TokenKind::LeftParen => {
                self.advance();
                let stmt = self.parse_statement()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(stmt)
            }
            _ => Err(self.unexpected(
                "SELECT, WITH, INSERT, CREATE, DROP, UPDATE, DELETE, or '('",
            )),
        }
    }

    /// Parses `WITH cte [, ...] SELECT ...`.
    fn parse_with_select(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::With)?;
        if self.check_keyword(Keyword::Recursive) {
            // Accepted for surface compatibility; CTEs here are plain.
            self.advance();
        }

        let mut ctes = Vec::new();
        loop {
            let name = self.expect_identifier()?;

            let columns = if self.check(&TokenKind::LeftParen) {
                self.advance();
                let cols = self.parse_identifier_list()?;
                self.expect(&TokenKind::RightParen)?;
                cols
            } else {
                Vec::new()
            };

            self.expect_keyword(Keyword::As)?;
            self.expect(&TokenKind::LeftParen)?;
            let query = self.parse_statement()?;
            self.expect(&TokenKind::RightParen)?;

            ctes.push(CteDefinition {
                name,
                columns,
                query,
            });

            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        let select = self.parse_select_statement(ctes)?;
        Ok(Statement::Select(Box::new(select)))
    }

    /// Parses a SELECT statement body; `ctes` come from a WITH prefix.
    fn parse_select_statement(
        &mut self,
        ctes: Vec<CteDefinition>,
    ) -> Result<SelectStatement, ParseError> {
        self.expect_keyword(Keyword::Select)?;

        let distinct = if self.check_keyword(Keyword::Distinct) {
            self.advance();
            true
        } else {
            if self.check_keyword(Keyword::All) {
                self.advance();
            }
            false
        };

        let mut projection = Vec::new();
        loop {
            projection.push(self.parse_select_item()?);
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        let from = if self.check_keyword(Keyword::From) {
            self.advance();
            Some(self.parse_table_ref()?)
        } else {
            None
        };

        // PREWHERE folds into WHERE as an extra conjunct.
        let prewhere = if self.check_keyword(Keyword::Prewhere) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        let where_expr = if self.check_keyword(Keyword::Where) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        let where_clause = match (prewhere, where_expr) {
            (Some(p), Some(w)) => Some(Expr::Binary {
                left: Box::new(p),
                op: crate::ast::BinaryOp::And,
                right: Box::new(w),
            }),
            (p, w) => p.or(w),
        };

        let group_by = if self.check_keyword(Keyword::Group) {
            self.advance();
            self.expect_keyword(Keyword::By)?;
            self.parse_expression_list()?
        } else {
            Vec::new()
        };

        let having = if self.check_keyword(Keyword::Having) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        let order_by = if self.check_keyword(Keyword::Order) {
            self.advance();
            self.expect_keyword(Keyword::By)?;
            self.parse_order_by_list()?
        } else {
            Vec::new()
        };

        let (mut limit, mut offset) = (None, None);
        if self.check_keyword(Keyword::Limit) {
            self.advance();
            let first = self.parse_expression(0)?;
            if self.check(&TokenKind::Comma) {
                // LIMIT n, m is offset = n, limit = m.
                self.advance();
                offset = Some(first);
                limit = Some(self.parse_expression(0)?);
            } else {
                limit = Some(first);
            }
        }
        if self.check_keyword(Keyword::Offset) {
            self.advance();
            offset = Some(self.parse_expression(0)?);
        }

        if self.check_keyword(Keyword::Settings) {
            self.advance();
            self.parse_settings_list()?;
        }

        if self.check_keyword(Keyword::Format) {
            self.advance();
            self.expect_identifier()?;
        }

        Ok(SelectStatement {
            ctes,
            distinct,
            projection,
            from,
            where_clause,
            group_by,
            having,
            order_by,
            limit,
            offset,
        })
    }

    /// Parses one projection (or ARRAY JOIN) item: an expression with an
    /// optional alias.
    fn parse_select_item(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression(0)?;

        let alias = if self.check_keyword(Keyword::As) {
            self.advance();
            Some(self.expect_identifier()?)
        } else if matches!(
            self.current().kind,
            TokenKind::Identifier(_) | TokenKind::QuotedIdentifier(_)
        ) {
            Some(self.expect_identifier()?)
        } else {
            None
        };

        Ok(match alias {
            Some(alias) => Expr::Aliased {
                expr: Box::new(expr),
                alias,
            },
            None => expr,
        })
    }

    /// Parses `SETTINGS name = value [, ...]`, discarding the pairs.
    fn parse_settings_list(&mut self) -> Result<(), ParseError> {
        loop {
            self.expect_identifier()?;
            self.expect(&TokenKind::Eq)?;
            self.parse_expression(0)?;
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                return Ok(());
            }
        }
    }

    // --- Table references ---

    /// Parses a table reference with any trailing join chain.
    fn parse_table_ref(&mut self) -> Result<TableRef, ParseError> {
        let mut table_ref = self.parse_table_primary()?;

        loop {
            // ARRAY JOIN
            if self.check_keyword(Keyword::Array)
                && self.peek_nth(1).as_keyword() == Some(Keyword::Join)
            {
                self.advance();
                self.advance();
                let mut exprs = Vec::new();
                loop {
                    exprs.push(self.parse_select_item()?);
                    if self.check(&TokenKind::Comma) {
                        self.advance();
                    } else {
                        break;
                    }
                }
                table_ref = TableRef::ArrayJoin {
                    left: Box::new(table_ref),
                    exprs,
                };
                continue;
            }

            // A bare comma between table primaries is a CROSS JOIN.
            if self.check(&TokenKind::Comma) {
                self.advance();
                let right = self.parse_table_primary()?;
                table_ref = TableRef::Join {
                    left: Box::new(table_ref),
                    kind: JoinKind::Cross,
                    right: Box::new(right),
                    on: None,
                    using: Vec::new(),
                };
                continue;
            }

            if !self.at_join_keyword() {
                break;
            }

            let kind = self.parse_join_kind()?;
            let right = self.parse_table_primary()?;

            let (on, using) = if kind == JoinKind::Cross {
                (None, Vec::new())
            } else if self.check_keyword(Keyword::On) {
                self.advance();
                (Some(self.parse_expression(0)?), Vec::new())
            } else if self.check_keyword(Keyword::Using) {
                self.advance();
                let cols = if self.check(&TokenKind::LeftParen) {
                    self.advance();
                    let cols = self.parse_identifier_list()?;
                    self.expect(&TokenKind::RightParen)?;
                    cols
                } else {
                    self.parse_identifier_list()?
                };
                (None, cols)
            } else {
                (None, Vec::new())
            };

            table_ref = TableRef::Join {
                left: Box::new(table_ref),
                kind,
                right: Box::new(right),
                on,
                using,
            };
        }

        Ok(table_ref)
    }

    /// Returns true if the current position starts a join clause.
    fn at_join_keyword(&self) -> bool {
        match self.current().as_keyword() {
            Some(
                Keyword::Join
                | Keyword::Inner
                | Keyword::Left
                | Keyword::Right
                | Keyword::Full
                | Keyword::Cross
                | Keyword::Asof,
            ) => true,
            Some(Keyword::Global | Keyword::Any) => matches!(
                self.peek_nth(1).as_keyword(),
                Some(
                    Keyword::Join
                        | Keyword::Inner
                        | Keyword::Left
                        | Keyword::Right
                        | Keyword::Full
                        | Keyword::Cross
                        | Keyword::Asof
                        | Keyword::Global
                        | Keyword::Any
                )
            ),
            _ => false,
        }
    }

    /// Parses the join-kind keywords, mapping them onto a [`JoinKind`].
    fn parse_join_kind(&mut self) -> Result<JoinKind, ParseError> {
        // GLOBAL and ANY prefixes are accepted and ignored.
        while matches!(
            self.current().as_keyword(),
            Some(Keyword::Global | Keyword::Any)
        ) {
            self.advance();
        }

        let kind = match self.current().as_keyword() {
            Some(Keyword::Join) => {
                self.advance();
                return Ok(JoinKind::Inner);
            }
            Some(Keyword::Inner) => {
                self.advance();
                JoinKind::Inner
            }
            Some(Keyword::Left) => {
                self.advance();
                match self.current().as_keyword() {
                    Some(Keyword::Semi) => {
                        self.advance();
                        JoinKind::LeftSemi
                    }
                    Some(Keyword::Anti) => {
                        self.advance();
                        JoinKind::LeftAnti
                    }
                    Some(Keyword::Outer) => {
                        self.advance();
                        JoinKind::Left
                    }
                    _ => JoinKind::Left,
                }
            }
            Some(Keyword::Right) => {
                self.advance();
                match self.current().as_keyword() {
                    Some(Keyword::Semi) => {
                        self.advance();
                        JoinKind::RightSemi
                    }
                    Some(Keyword::Anti) => {
                        self.advance();
                        JoinKind::RightAnti
                    }
                    Some(Keyword::Outer) => {
                        self.advance();
                        JoinKind::Right
                    }
                    _ => JoinKind::Right,
                }
            }
            Some(Keyword::Full) => {
                self.advance();
                if self.check_keyword(Keyword::Outer) {
                    self.advance();
                }
                JoinKind::Full
            }
            Some(Keyword::Cross) => {
                self.advance();
                JoinKind::Cross
            }
            Some(Keyword::Asof) => {
                self.advance();
                JoinKind::Asof
            }
            _ => return Err(self.unexpected("a JOIN keyword")),
        };

        if self.check_keyword(Keyword::Join) {
            self.advance();
        }
        Ok(kind)
    }

    /// Parses a single table primary: name, subquery, or table function.
    fn parse_table_primary(&mut self) -> Result<TableRef, ParseError> {
        if self.check(&TokenKind::LeftParen) {
            self.advance();
            if matches!(
                self.current().as_keyword(),
                Some(Keyword::Select | Keyword::With)
            ) || self.check(&TokenKind::LeftParen)
            {
                let query = self.parse_statement()?;
                self.expect(&TokenKind::RightParen)?;
                let alias = self.parse_optional_alias()?;
                return Ok(TableRef::Subquery {
                    query: Box::new(query),
                    alias: alias.unwrap_or_else(|| String::from("subquery")),
                });
            }
            let inner = self.parse_table_ref()?;
            self.expect(&TokenKind::RightParen)?;
            return Ok(inner);
        }

        let name = self.expect_identifier()?;

        if self.check(&TokenKind::LeftParen) {
            self.advance();
            let args = if self.check(&TokenKind::RightParen) {
                Vec::new()
            } else {
                self.parse_expression_list()?
            };
            self.expect(&TokenKind::RightParen)?;
            let alias = self.parse_optional_alias()?;
            return Ok(TableRef::TableFunction { name, args, alias });
        }

        let alias = self.parse_optional_alias()?;

        // FINAL and SAMPLE are accepted after a table and ignored.
        if self.check_keyword(Keyword::Final) {
            self.advance();
        }
        if self.check_keyword(Keyword::Sample) {
            self.advance();
            self.parse_expression(0)?;
        }

        Ok(TableRef::Table { name, alias })
    }

    /// Parses an optional `[AS] alias`.
    fn parse_optional_alias(&mut self) -> Result<Option<String>, ParseError> {
        if self.check_keyword(Keyword::As) {
            self.advance();
            return Ok(Some(self.expect_identifier()?));
        }
        if matches!(
            self.current().kind,
            TokenKind::Identifier(_) | TokenKind::QuotedIdentifier(_)
        ) {
            return Ok(Some(self.expect_identifier()?));
        }
        Ok(None)
    }

    // --- DML / DDL statements ---

    /// Parses `INSERT INTO table [(cols)] VALUES ... | SELECT ...`.
    fn parse_insert_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Insert)?;
        self.expect_keyword(Keyword::Into)?;
        let table = self.expect_identifier()?;

        let columns = if self.check(&TokenKind::LeftParen) {
            self.advance();
            let cols = self.parse_identifier_list()?;
            self.expect(&TokenKind::RightParen)?;
            cols
        } else {
            Vec::new()
        };

        let source = if self.check_keyword(Keyword::Values) {
            self.advance();
            let mut rows = Vec::new();
            loop {
                self.expect(&TokenKind::LeftParen)?;
                let row = if self.check(&TokenKind::RightParen) {
                    Vec::new()
                } else {
                    self.parse_expression_list()?
                };
                self.expect(&TokenKind::RightParen)?;
                rows.push(row);
                if self.check(&TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
            InsertSource::Values(rows)
        } else if matches!(
            self.current().as_keyword(),
            Some(Keyword::Select | Keyword::With)
        ) {
            InsertSource::Select(Box::new(self.parse_statement()?))
        } else {
            return Err(self.unexpected("VALUES or SELECT"));
        };

        Ok(Statement::Insert(InsertStatement {
            table,
            columns,
            source,
        }))
    }

    /// Parses `CREATE TABLE [IF NOT EXISTS] name (columns) [engine tail]`.
    fn parse_create_table(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Create)?;
        self.expect_keyword(Keyword::Table)?;

        let if_not_exists = if self.check_keyword(Keyword::If) {
            self.advance();
            self.expect_keyword(Keyword::Not)?;
            self.expect_keyword(Keyword::Exists)?;
            true
        } else {
            false
        };

        let name = self.expect_identifier()?;

        self.expect(&TokenKind::LeftParen)?;
        let mut columns = Vec::new();
        loop {
            let col_name = self.expect_identifier()?;
            let data_type = self.parse_data_type()?;

            let default = if self.current().is_ident("DEFAULT") {
                self.advance();
                Some(self.parse_expression(0)?)
            } else {
                None
            };

            columns.push(ColumnDef {
                name: col_name,
                data_type,
                default,
            });

            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(&TokenKind::RightParen)?;

        let mut primary_key = Vec::new();
        let mut order_by = Vec::new();

        // Engine tail clauses come in any order; ENGINE parameters are
        // skipped, PRIMARY KEY and ORDER BY are recorded but not enforced.
        loop {
            if self.current().is_ident("ENGINE") {
                self.advance();
                self.expect(&TokenKind::Eq)?;
                self.expect_identifier()?;
                if self.check(&TokenKind::LeftParen) {
                    self.skip_parenthesized()?;
                }
            } else if self.current().is_ident("PRIMARY") {
                self.advance();
                if !self.current().is_ident("KEY") {
                    return Err(self.unexpected("KEY"));
                }
                self.advance();
                primary_key = self.parse_key_expression_list()?;
            } else if self.check_keyword(Keyword::Order) {
                self.advance();
                self.expect_keyword(Keyword::By)?;
                order_by = self.parse_key_expression_list()?;
            } else if self.check_keyword(Keyword::Settings) {
                self.advance();
                self.parse_settings_list()?;
            } else {
                break;
            }
        }

        Ok(Statement::CreateTable(CreateTableStatement {
            name,
            if_not_exists,
            columns,
            primary_key,
            order_by,
        }))
    }

    /// Parses a key list that may be a single expression or a
    /// parenthesized tuple, as in `ORDER BY (a, b)`.
    fn parse_key_expression_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let expr = self.parse_expression(0)?;
        Ok(match expr {
            Expr::Tuple(items) => items,
            other => vec![other],
        })
    }

    /// Skips a balanced parenthesized region, starting at `(`.
    fn skip_parenthesized(&mut self) -> Result<(), ParseError> {
        self.expect(&TokenKind::LeftParen)?;
        let mut depth = 1usize;
        while depth > 0 {
            match &self.current().kind {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => depth -= 1,
                TokenKind::Eof => return Err(self.unexpected("')'")),
                _ => {}
            }
            self.advance();
        }
        Ok(())
    }

    /// Parses `DROP TABLE [IF EXISTS] name`.
    fn parse_drop_table(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Drop)?;
        self.expect_keyword(Keyword::Table)?;

        let if_exists = if self.check_keyword(Keyword::If) {
            self.advance();
            self.expect_keyword(Keyword::Exists)?;
            true
        } else {
            false
        };

        let name = self.expect_identifier()?;
        Ok(Statement::DropTable(DropTableStatement { name, if_exists }))
    }

    /// Parses `UPDATE table SET col = expr [, ...] [WHERE expr]`.
    fn parse_update_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Update)?;
        let table = self.expect_identifier()?;
        self.expect_keyword(Keyword::Set)?;

        let mut assignments = Vec::new();
        loop {
            let column = self.expect_identifier()?;
            self.expect(&TokenKind::Eq)?;
            let value = self.parse_expression(0)?;
            assignments.push(Assignment { column, value });
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        let where_clause = if self.check_keyword(Keyword::Where) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        Ok(Statement::Update(UpdateStatement {
            table,
            assignments,
            where_clause,
        }))
    }

    /// Parses `DELETE FROM table [WHERE expr]`.
    fn parse_delete_statement(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::Delete)?;
        self.expect_keyword(Keyword::From)?;
        let table = self.expect_identifier()?;

        let where_clause = if self.check_keyword(Keyword::Where) {
            self.advance();
            Some(self.parse_expression(0)?)
        } else {
            None
        };

        Ok(Statement::Delete(DeleteStatement {
            table,
            where_clause,
        }))
    }

    // --- Clause pieces ---

    /// Parses an ORDER BY item list.
    fn parse_order_by_list(&mut self) -> Result<Vec<OrderByExpr>, ParseError> {
        let mut items = Vec::new();
        loop {
            let expr = self.parse_expression(0)?;

            let direction = if self.check_keyword(Keyword::Desc) {
                self.advance();
                OrderDirection::Desc
            } else {
                if self.check_keyword(Keyword::Asc) {
                    self.advance();
                }
                OrderDirection::Asc
            };

            let nulls = if self.current().is_ident("NULLS") {
                self.advance();
                if self.current().is_ident("FIRST") {
                    self.advance();
                    Some(NullOrdering::First)
                } else if self.current().is_ident("LAST") {
                    self.advance();
                    Some(NullOrdering::Last)
                } else {
                    return Err(self.unexpected("FIRST or LAST"));
                }
            } else {
                None
            };

            items.push(OrderByExpr {
                expr,
                direction,
                nulls,
            });

            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        Ok(items)
    }

    // --- Expressions ---

    /// Parses an expression with Pratt precedence climbing.
    pub(crate) fn parse_expression(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let Some((l_bp, r_bp)) = infix_binding_power(&self.current().kind) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }

            lhs = match &self.current().kind {
                TokenKind::Question => {
                    self.advance();
                    let then_expr = self.parse_expression(0)?;
                    self.expect(&TokenKind::Colon)?;
                    let else_expr = self.parse_expression(TERNARY_RIGHT_BP)?;
                    Expr::Conditional {
                        condition: Box::new(lhs),
                        then_expr: Box::new(then_expr),
                        else_expr: Box::new(else_expr),
                    }
                }
                TokenKind::Keyword(Keyword::Is) => {
                    self.advance();
                    let negated = if self.check_keyword(Keyword::Not) {
                        self.advance();
                        true
                    } else {
                        false
                    };
                    self.expect_keyword(Keyword::Null)?;
                    Expr::IsNull {
                        expr: Box::new(lhs),
                        negated,
                    }
                }
                TokenKind::Keyword(Keyword::In) => self.parse_in_tail(lhs, false)?,
                TokenKind::Keyword(Keyword::Between) => {
                    self.parse_between_tail(lhs, false, r_bp)?
                }
                TokenKind::Keyword(Keyword::Not) => {
                    self.advance();
                    match self.current().as_keyword() {
                        Some(Keyword::In) => self.parse_in_tail(lhs, true)?,
                        Some(Keyword::Between) => self.parse_between_tail(lhs, true, r_bp)?,
                        Some(kw @ (Keyword::Like | Keyword::Ilike)) => {
                            self.advance();
                            let op = if kw == Keyword::Like {
                                crate::ast::BinaryOp::Like
                            } else {
                                crate::ast::BinaryOp::ILike
                            };
                            let rhs = self.parse_expression(r_bp)?;
                            Expr::Unary {
                                op: UnaryOp::Not,
                                operand: Box::new(Expr::Binary {
                                    left: Box::new(lhs),
                                    op,
                                    right: Box::new(rhs),
                                }),
                            }
                        }
                        _ => return Err(self.unexpected("IN, BETWEEN, LIKE, or ILIKE")),
                    }
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let index = self.parse_expression(0)?;
                    self.expect(&TokenKind::RightBracket)?;
                    Expr::Index {
                        base: Box::new(lhs),
                        index: Box::new(index),
                    }
                }
                TokenKind::Dot => {
                    self.advance();
                    let name = match &self.current().kind {
                        TokenKind::Identifier(n) | TokenKind::QuotedIdentifier(n) => {
                            let n = n.clone();
                            self.advance();
                            n
                        }
                        TokenKind::Integer(n) => {
                            let n = n.to_string();
                            self.advance();
                            n
                        }
                        _ => return Err(self.unexpected("a member name or position")),
                    };
                    Expr::Member {
                        base: Box::new(lhs),
                        name,
                    }
                }
                TokenKind::DoubleColon => {
                    self.advance();
                    let data_type = self.parse_data_type()?;
                    Expr::Cast {
                        expr: Box::new(lhs),
                        data_type,
                    }
                }
                TokenKind::Keyword(Keyword::Over) => {
                    self.advance();
                    let spec = self.parse_window_spec()?;
                    match lhs {
                        Expr::Function(call) => Expr::Window { call, spec },
                        _ => return Err(self.unexpected("a function call before OVER")),
                    }
                }
                kind => {
                    if let Some(op) = token_to_binary_op(kind) {
                        self.advance();
                        let rhs = self.parse_expression(r_bp)?;
                        Expr::Binary {
                            left: Box::new(lhs),
                            op,
                            right: Box::new(rhs),
                        }
                    } else {
                        break;
                    }
                }
            };
        }

        Ok(lhs)
    }

    /// Parses the remainder of an IN predicate after the probe expression.
    fn parse_in_tail(&mut self, lhs: Expr, negated: bool) -> Result<Expr, ParseError> {
        self.expect_keyword(Keyword::In)?;
        self.expect(&TokenKind::LeftParen)?;

        let list = if matches!(
            self.current().as_keyword(),
            Some(Keyword::Select | Keyword::With)
        ) {
            let stmt = self.parse_statement()?;
            InList::Subquery(Box::new(stmt))
        } else {
            InList::Values(self.parse_expression_list()?)
        };

        self.expect(&TokenKind::RightParen)?;
        Ok(Expr::In {
            expr: Box::new(lhs),
            list,
            negated,
        })
    }

    /// Parses the remainder of a BETWEEN predicate.
    fn parse_between_tail(
        &mut self,
        lhs: Expr,
        negated: bool,
        r_bp: u8,
    ) -> Result<Expr, ParseError> {
        self.expect_keyword(Keyword::Between)?;
        let low = self.parse_expression(r_bp)?;
        self.expect_keyword(Keyword::And)?;
        let high = self.parse_expression(r_bp)?;
        Ok(Expr::Between {
            expr: Box::new(lhs),
            low: Box::new(low),
            high: Box::new(high),
            negated,
        })
    }

    /// Parses a prefix expression (unary operator or primary).
    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        match &self.current().kind {
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_expression(SIGN_BP)?;
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                })
            }
            // Unary plus is the identity.
            TokenKind::Plus => {
                self.advance();
                self.parse_expression(SIGN_BP)
            }
            TokenKind::Keyword(Keyword::Not) => {
                self.advance();
                let operand = self.parse_expression(NOT_BP)?;
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                })
            }
            _ => self.parse_primary(),
        }
    }

    /// Parses a primary expression.
    #[allow(clippy::too_many_lines)]
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match &self.current().kind {
            TokenKind::Integer(n) => {
                let n = *n;
                self.advance();
                Ok(Expr::Literal(Literal::Integer(n)))
            }
            TokenKind::Float(v) => {
                let v = *v;
                self.advance();
                Ok(Expr::Literal(Literal::Float(v)))
            }
            TokenKind::String(s) => {
                let s = s.clone();
                self.advance();
                Ok(Expr::Literal(Literal::String(s)))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(true)))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(false)))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }

            TokenKind::Question => {
                self.param_counter += 1;
                let position = self.param_counter;
                self.advance();
                Ok(Expr::Parameter(position))
            }

            TokenKind::Star => {
                self.advance();
                Ok(Expr::Star { table: None })
            }

            // Array literal
            TokenKind::LeftBracket => {
                self.advance();
                let items = if self.check(&TokenKind::RightBracket) {
                    Vec::new()
                } else {
                    self.parse_expression_list()?
                };
                self.expect(&TokenKind::RightBracket)?;
                Ok(Expr::Array(items))
            }

            // Parenthesized expression, tuple, or subquery
            TokenKind::LeftParen => {
                self.advance();
                if matches!(
                    self.current().as_keyword(),
                    Some(Keyword::Select | Keyword::With)
                ) {
                    let stmt = self.parse_statement()?;
                    self.expect(&TokenKind::RightParen)?;
                    return Ok(Expr::Subquery(Box::new(stmt)));
                }
                let first = self.parse_expression(0)?;
                if self.check(&TokenKind::Comma) {
                    let mut items = vec![first];
                    while self.check(&TokenKind::Comma) {
                        self.advance();
                        items.push(self.parse_expression(0)?);
                    }
                    self.expect(&TokenKind::RightParen)?;
                    return Ok(Expr::Tuple(items));
                }
                self.expect(&TokenKind::RightParen)?;
                Ok(first)
            }

            TokenKind::Keyword(Keyword::Case) => self.parse_case_expression(),

            TokenKind::Keyword(Keyword::Cast) => self.parse_cast_expression(),

            TokenKind::Keyword(Keyword::Exists) => {
                self.advance();
                self.expect(&TokenKind::LeftParen)?;
                let stmt = self.parse_statement()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(Expr::Exists(Box::new(stmt)))
            }

            TokenKind::Identifier(_) | TokenKind::QuotedIdentifier(_) => {
                let name = self.expect_identifier()?;

                if self.check(&TokenKind::LeftParen) {
                    return self.parse_function_call(name);
                }

                // Qualified column or star; `.1` tuple access stays for
                // the postfix loop.
                if self.check(&TokenKind::Dot) {
                    match &self.peek_nth(1).kind {
                        TokenKind::Star => {
                            self.advance();
                            self.advance();
                            return Ok(Expr::Star { table: Some(name) });
                        }
                        TokenKind::Identifier(_) | TokenKind::QuotedIdentifier(_) => {
                            self.advance();
                            let column = self.expect_identifier()?;
                            return Ok(Expr::Column {
                                table: Some(name),
                                name: column,
                            });
                        }
                        _ => {}
                    }
                }

                Ok(Expr::Column { table: None, name })
            }

            // A small keyword whitelist may head function calls.
            TokenKind::Keyword(kw) => {
                if let Some((_, name)) = IDENT_KEYWORDS.iter().find(|(k, _)| k == kw) {
                    if matches!(self.peek_nth(1).kind, TokenKind::LeftParen) {
                        let name = String::from(*name);
                        self.advance();
                        return self.parse_function_call(name);
                    }
                }
                Err(self.unexpected("an expression"))
            }

            _ => Err(self.unexpected("an expression")),
        }
    }

    /// Parses a function call after its name, handling DISTINCT and
    /// lambda arguments.
    fn parse_function_call(&mut self, name: String) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LeftParen)?;

        let distinct = if self.check_keyword(Keyword::Distinct) {
            self.advance();
            true
        } else {
            false
        };

        let mut args = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                args.push(self.parse_function_arg()?);
                if self.check(&TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightParen)?;

        Ok(Expr::Function(FunctionCall {
            name,
            args,
            distinct,
        }))
    }

    /// Parses one function argument: `*`, a lambda, or an expression.
    ///
    /// Lambda detection looks ahead for `ident ->` or `(idents) ->` and
    /// restores the saved position when the shape does not match.
    fn parse_function_arg(&mut self) -> Result<Expr, ParseError> {
        if self.check(&TokenKind::Star)
            && matches!(
                self.peek_nth(1).kind,
                TokenKind::Comma | TokenKind::RightParen
            )
        {
            self.advance();
            return Ok(Expr::Star { table: None });
        }

        if let Some(lambda) = self.try_parse_lambda()? {
            return Ok(lambda);
        }

        self.parse_expression(0)
    }

    /// Attempts to parse a lambda; returns `None` (with the position
    /// restored) when the argument is not lambda-shaped.
    fn try_parse_lambda(&mut self) -> Result<Option<Expr>, ParseError> {
        let saved = self.pos;

        // ident -> body
        if matches!(self.current().kind, TokenKind::Identifier(_))
            && matches!(self.peek_nth(1).kind, TokenKind::Arrow)
        {
            let param = self.expect_identifier()?;
            self.advance(); // ->
            let body = self.parse_expression(0)?;
            return Ok(Some(Expr::Lambda {
                params: vec![param],
                body: Box::new(body),
            }));
        }

        // (ident, ident, ...) -> body
        if self.check(&TokenKind::LeftParen) {
            self.advance();
            let mut params = Vec::new();
            loop {
                match &self.current().kind {
                    TokenKind::Identifier(n) => {
                        params.push(n.clone());
                        self.advance();
                    }
                    _ => {
                        self.pos = saved;
                        return Ok(None);
                    }
                }
                if self.check(&TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
            if self.check(&TokenKind::RightParen)
                && matches!(self.peek_nth(1).kind, TokenKind::Arrow)
            {
                self.advance(); // )
                self.advance(); // ->
                let body = self.parse_expression(0)?;
                return Ok(Some(Expr::Lambda {
                    params,
                    body: Box::new(body),
                }));
            }
            self.pos = saved;
        }

        Ok(None)
    }

    /// Parses a CASE expression (simple or searched).
    fn parse_case_expression(&mut self) -> Result<Expr, ParseError> {
        self.expect_keyword(Keyword::Case)?;

        let operand = if self.check_keyword(Keyword::When) {
            None
        } else {
            Some(Box::new(self.parse_expression(0)?))
        };

        let mut when_clauses = Vec::new();
        while self.check_keyword(Keyword::When) {
            self.advance();
            let when_expr = self.parse_expression(0)?;
            self.expect_keyword(Keyword::Then)?;
            let then_expr = self.parse_expression(0)?;
            when_clauses.push((when_expr, then_expr));
        }
        if when_clauses.is_empty() {
            return Err(self.unexpected("WHEN"));
        }

        let else_clause = if self.check_keyword(Keyword::Else) {
            self.advance();
            Some(Box::new(self.parse_expression(0)?))
        } else {
            None
        };

        self.expect_keyword(Keyword::End)?;

        Ok(Expr::Case {
            operand,
            when_clauses,
            else_clause,
        })
    }

    /// Parses `CAST(expr AS type)` or `CAST(expr, 'type')`.
    fn parse_cast_expression(&mut self) -> Result<Expr, ParseError> {
        self.expect_keyword(Keyword::Cast)?;
        self.expect(&TokenKind::LeftParen)?;
        let expr = self.parse_expression(0)?;

        let data_type = if self.check_keyword(Keyword::As) {
            self.advance();
            self.parse_data_type()?
        } else if self.check(&TokenKind::Comma) {
            self.advance();
            match &self.current().kind {
                TokenKind::String(s) => {
                    let dt = DataType::simple(s.clone());
                    self.advance();
                    dt
                }
                _ => return Err(self.unexpected("a type name string")),
            }
        } else {
            return Err(self.unexpected("AS or ','"));
        };

        self.expect(&TokenKind::RightParen)?;
        Ok(Expr::Cast {
            expr: Box::new(expr),
            data_type,
        })
    }

    /// Parses an `OVER (...)` window specification.
    fn parse_window_spec(&mut self) -> Result<WindowSpec, ParseError> {
        self.expect(&TokenKind::LeftParen)?;

        let partition_by = if self.check_keyword(Keyword::Partition) {
            self.advance();
            self.expect_keyword(Keyword::By)?;
            self.parse_expression_list()?
        } else {
            Vec::new()
        };

        let order_by = if self.check_keyword(Keyword::Order) {
            self.advance();
            self.expect_keyword(Keyword::By)?;
            self.parse_order_by_list()?
        } else {
            Vec::new()
        };

        let frame = match self.current().as_keyword() {
            Some(kw @ (Keyword::Rows | Keyword::Range)) => {
                let units = if kw == Keyword::Rows {
                    FrameUnits::Rows
                } else {
                    FrameUnits::Range
                };
                self.advance();

                if self.check_keyword(Keyword::Between) {
                    self.advance();
                    let start = self.parse_frame_bound()?;
                    self.expect_keyword(Keyword::And)?;
                    let end = self.parse_frame_bound()?;
                    Some(WindowFrame {
                        units,
                        start,
                        end: Some(end),
                    })
                } else {
                    let start = self.parse_frame_bound()?;
                    Some(WindowFrame {
                        units,
                        start,
                        end: None,
                    })
                }
            }
            _ => None,
        };

        self.expect(&TokenKind::RightParen)?;
        Ok(WindowSpec {
            partition_by,
            order_by,
            frame,
        })
    }

    /// Parses a single window frame bound.
    fn parse_frame_bound(&mut self) -> Result<FrameBound, ParseError> {
        match self.current().as_keyword() {
            Some(Keyword::Unbounded) => {
                self.advance();
                match self.current().as_keyword() {
                    Some(Keyword::Preceding) => {
                        self.advance();
                        Ok(FrameBound::UnboundedPreceding)
                    }
                    Some(Keyword::Following) => {
                        self.advance();
                        Ok(FrameBound::UnboundedFollowing)
                    }
                    _ => Err(self.unexpected("PRECEDING or FOLLOWING")),
                }
            }
            Some(Keyword::Current) => {
                self.advance();
                self.expect_keyword(Keyword::Row)?;
                Ok(FrameBound::CurrentRow)
            }
            _ => {
                let expr = self.parse_expression(0)?;
                match self.current().as_keyword() {
                    Some(Keyword::Preceding) => {
                        self.advance();
                        Ok(FrameBound::Preceding(Box::new(expr)))
                    }
                    Some(Keyword::Following) => {
                        self.advance();
                        Ok(FrameBound::Following(Box::new(expr)))
                    }
                    _ => Err(self.unexpected("PRECEDING or FOLLOWING")),
                }
            }
        }
    }

    /// Parses a data type, e.g. `Nullable(Int64)` or
    /// `Tuple(id Int64, name String)`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when the current tokens do not form a
    /// type.
    pub fn parse_data_type(&mut self) -> Result<DataType, ParseError> {
        let name = match &self.current().kind {
            TokenKind::Identifier(n) | TokenKind::QuotedIdentifier(n) => {
                let n = n.clone();
                self.advance();
                n
            }
            // Composite type heads are keywords of the dialect.
            TokenKind::Keyword(Keyword::Array) => {
                self.advance();
                String::from("Array")
            }
            TokenKind::Keyword(Keyword::Tuple) => {
                self.advance();
                String::from("Tuple")
            }
            TokenKind::Keyword(Keyword::Map) => {
                self.advance();
                String::from("Map")
            }
            TokenKind::Keyword(Keyword::Nullable) => {
                self.advance();
                String::from("Nullable")
            }
            _ => return Err(self.unexpected("a type name")),
        };

        if !self.check(&TokenKind::LeftParen) {
            return Ok(DataType::simple(name));
        }
        self.advance();

        let mut args = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                args.push(self.parse_type_arg()?);
                if self.check(&TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightParen)?;

        Ok(DataType::with_args(name, args))
    }

    /// Parses one argument of a parameterized type.
    fn parse_type_arg(&mut self) -> Result<TypeArg, ParseError> {
        match &self.current().kind {
            TokenKind::Integer(n) => {
                let n = *n;
                self.advance();
                Ok(TypeArg::Integer(n))
            }
            TokenKind::String(s) => {
                let s = s.clone();
                self.advance();
                // Enum8('a' = 1, ...) values: keep the name, drop the code.
                if self.check(&TokenKind::Eq) {
                    self.advance();
                    match &self.current().kind {
                        TokenKind::Integer(_) => self.advance(),
                        _ => return Err(self.unexpected("an integer enum value")),
                    }
                }
                Ok(TypeArg::String(s))
            }
            TokenKind::Identifier(_) | TokenKind::QuotedIdentifier(_) => {
                // `name Type` is a named tuple element.
                let named = matches!(
                    self.peek_nth(1).kind,
                    TokenKind::Identifier(_)
                        | TokenKind::QuotedIdentifier(_)
                        | TokenKind::Keyword(
                            Keyword::Array | Keyword::Tuple | Keyword::Map | Keyword::Nullable
                        )
                );
                if named {
                    let name = self.expect_identifier()?;
                    let data_type = self.parse_data_type()?;
                    Ok(TypeArg::Named { name, data_type })
                } else {
                    Ok(TypeArg::Type(self.parse_data_type()?))
                }
            }
            TokenKind::Keyword(
                Keyword::Array | Keyword::Tuple | Keyword::Map | Keyword::Nullable,
            ) => Ok(TypeArg::Type(self.parse_data_type()?)),
            _ => Err(self.unexpected("a type argument")),
        }
    }

    /// Parses a comma-separated list of expressions.
    fn parse_expression_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = Vec::new();
        loop {
            exprs.push(self.parse_expression(0)?);
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        Ok(exprs)
    }

    /// Parses a comma-separated list of identifiers.
    fn parse_identifier_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut idents = Vec::new();
        loop {
            idents.push(self.expect_identifier()?);
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        Ok(idents)
    }

    // --- Helpers ---

    /// The current token.
    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    /// The token `n` positions ahead (saturating at EOF).
    fn peek_nth(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    /// Advances to the next token; stays on EOF.
    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    /// Checks the current token kind by discriminant.
    fn check(&self, kind: &TokenKind) -> bool {
        core::mem::discriminant(&self.current().kind) == core::mem::discriminant(kind)
    }

    /// Checks if the current token is the given keyword.
    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current().as_keyword() == Some(keyword)
    }

    /// Expects the current token to be of the given kind.
    fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(kind.to_string()))
        }
    }

    /// Expects the current token to be the given keyword.
    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), ParseError> {
        if self.check_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(keyword.as_str()))
        }
    }

    /// Expects and returns an identifier (plain or backtick-quoted).
    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match &self.current().kind {
            TokenKind::Identifier(name) | TokenKind::QuotedIdentifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    /// Builds the error for an unexpected current token. An invalid token
    /// from the lexer surfaces as a lex error instead.
    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        let token = self.current();
        match &token.kind {
            TokenKind::Error(message) => ParseError::lex(message.clone(), token.span),
            kind => ParseError::unexpected(expected, kind.clone(), token.span),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOp;

    fn parse(sql: &str) -> Result<Statement, ParseError> {
        let mut parser = Parser::new(sql);
        let stmt = parser.parse_statement()?;
        parser.expect_end()?;
        Ok(stmt)
    }

    fn parse_expr(sql: &str) -> Expr {
        let stmt = parse(&format!("SELECT {sql}")).expect("parse failed");
        match stmt {
            Statement::Select(s) => s.projection.into_iter().next().unwrap(),
            other => panic!("expected SELECT, got {other:?}"),
        }
    }

    #[test]
    fn test_simple_select() {
        let stmt = parse("SELECT id, name FROM users").unwrap();
        assert!(matches!(stmt, Statement::Select(_)));
    }

    #[test]
    fn test_expression_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let expr = parse_expr("1 + 2 * 3");
        let Expr::Binary { op, right, .. } = expr else {
            panic!("expected binary expression");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(
            *right,
            Expr::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn test_ternary_conditional() {
        let expr = parse_expr("a > 1 ? 'big' : 'small'");
        assert!(matches!(expr, Expr::Conditional { .. }));
    }

    #[test]
    fn test_postfix_cast_and_index() {
        let expr = parse_expr("xs[1]::Int64");
        let Expr::Cast { expr: inner, .. } = expr else {
            panic!("expected cast");
        };
        assert!(matches!(*inner, Expr::Index { .. }));
    }

    #[test]
    fn test_not_like_wraps_like() {
        let expr = parse_expr("name NOT LIKE 'a%'");
        let Expr::Unary {
            op: UnaryOp::Not,
            operand,
        } = expr
        else {
            panic!("expected NOT wrapper");
        };
        assert!(matches!(
            *operand,
            Expr::Binary {
                op: BinaryOp::Like,
                ..
            }
        ));
    }

    #[test]
    fn test_lambda_argument() {
        let expr = parse_expr("arrayMap(x -> x + 1, xs)");
        let Expr::Function(call) = expr else {
            panic!("expected function");
        };
        assert!(matches!(call.args[0], Expr::Lambda { .. }));
    }

    #[test]
    fn test_paren_expression_is_not_lambda() {
        let expr = parse_expr("f((a), b)");
        let Expr::Function(call) = expr else {
            panic!("expected function");
        };
        assert!(matches!(call.args[0], Expr::Column { .. }));
        assert_eq!(call.args.len(), 2);
    }

    #[test]
    fn test_set_operation_left_associative() {
        let stmt = parse("SELECT 1 UNION SELECT 2 UNION ALL SELECT 3").unwrap();
        let Statement::SetOperation { op, all, left, .. } = stmt else {
            panic!("expected set operation");
        };
        assert_eq!(op, SetOperator::Union);
        assert!(all);
        assert!(matches!(*left, Statement::SetOperation { all: false, .. }));
    }

    #[test]
    fn test_join_kinds() {
        let stmt = parse(
            "SELECT * FROM a LEFT ANTI JOIN b ON a.id = b.id",
        )
        .unwrap();
        let Statement::Select(select) = stmt else {
            panic!("expected select");
        };
        let Some(TableRef::Join { kind, .. }) = select.from else {
            panic!("expected join");
        };
        assert_eq!(kind, JoinKind::LeftAnti);
    }

    #[test]
    fn test_comma_join_is_cross() {
        let stmt = parse("SELECT * FROM a, b").unwrap();
        let Statement::Select(select) = stmt else {
            panic!("expected select");
        };
        assert!(matches!(
            select.from,
            Some(TableRef::Join {
                kind: JoinKind::Cross,
                ..
            })
        ));
    }

    #[test]
    fn test_window_function() {
        let expr = parse_expr(
            "rank() OVER (PARTITION BY dept ORDER BY score DESC ROWS BETWEEN 1 PRECEDING AND CURRENT ROW)",
        );
        let Expr::Window { call, spec } = expr else {
            panic!("expected window");
        };
        assert_eq!(call.name, "rank");
        assert_eq!(spec.partition_by.len(), 1);
        assert_eq!(spec.order_by.len(), 1);
        let frame = spec.frame.expect("frame");
        assert_eq!(frame.units, FrameUnits::Rows);
        assert!(matches!(frame.start, FrameBound::Preceding(_)));
        assert!(matches!(frame.end, Some(FrameBound::CurrentRow)));
    }

    #[test]
    fn test_create_table_with_engine_tail() {
        let stmt = parse(
            "CREATE TABLE IF NOT EXISTS t (id Int64, name String DEFAULT 'x') \
             ENGINE = MergeTree() ORDER BY id",
        )
        .unwrap();
        let Statement::CreateTable(create) = stmt else {
            panic!("expected create");
        };
        assert!(create.if_not_exists);
        assert_eq!(create.columns.len(), 2);
        assert!(create.columns[1].default.is_some());
        assert_eq!(create.order_by.len(), 1);
    }

    #[test]
    fn test_nested_data_type() {
        let mut parser = Parser::new("Map(String, Array(Nullable(Int64)))");
        let dt = parser.parse_data_type().unwrap();
        assert_eq!(dt.to_string(), "Map(String, Array(Nullable(Int64)))");
    }

    #[test]
    fn test_with_cte() {
        let stmt = parse("WITH d AS (SELECT 1 AS x) SELECT x FROM d").unwrap();
        let Statement::Select(select) = stmt else {
            panic!("expected select");
        };
        assert_eq!(select.ctes.len(), 1);
        assert_eq!(select.ctes[0].name, "d");
    }

    #[test]
    fn test_limit_comma_form() {
        let stmt = parse("SELECT 1 FROM t LIMIT 5, 10").unwrap();
        let Statement::Select(select) = stmt else {
            panic!("expected select");
        };
        assert!(matches!(
            select.offset,
            Some(Expr::Literal(Literal::Integer(5)))
        ));
        assert!(matches!(
            select.limit,
            Some(Expr::Literal(Literal::Integer(10)))
        ));
    }

    #[test]
    fn test_parse_error_has_position() {
        let err = parse("SELECT FROM").unwrap_err();
        assert!(matches!(err, ParseError::Unexpected { .. }));
        assert_eq!(err.line(), 1);
        assert_eq!(err.column(), 8);
    }

    #[test]
    fn test_lex_error_surfaces() {
        let err = parse("SELECT #").unwrap_err();
        assert!(matches!(err, ParseError::Lex { .. }));
    }
}
