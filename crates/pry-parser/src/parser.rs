// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The parser implementation using Pratt parsing for expressions.

use pry_ast::decl::{Decl, DeclKind, File, FnDecl, ImportDecl, TypeDecl, ValueDecl};
use pry_ast::expr::{BinOp, Expr, ExprKind, Field, FuncLit, Param, UnaryOp};
use pry_ast::stmt::{AssignOp, CaseClause, CommClause, Stmt, StmtKind};
use pry_ast::token::{Token, TokenKind};
use pry_ast::Span;

/// Maximum number of errors to collect before stopping.
const MAX_ERRORS: usize = 20;

/// The parser for host-language source code.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Controls whether `{` can start composite literals (false in control
    /// flow clauses, per the host grammar)
    allow_brace_expr: bool,
    /// Collected errors during parsing
    errors: Vec<ParseError>,
}

/// Outcome of a simple-statement parse; `for` clauses may resolve to range.
enum SimpleStmt {
    Stmt(Stmt),
    Range {
        key: Option<String>,
        value: Option<String>,
        x: Expr,
    },
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            allow_brace_expr: true,
            errors: Vec::new(),
        }
    }

    /// Record error, return whether parsing should continue.
    fn record_error(&mut self, error: ParseError) -> bool {
        self.errors.push(error);
        self.errors.len() < MAX_ERRORS
    }

    /// Skip to the next top-level declaration after an error.
    fn synchronize(&mut self) {
        let mut brace_depth = 0;

        while !self.at_end() {
            match self.current_kind() {
                TokenKind::LBrace => {
                    brace_depth += 1;
                    self.advance();
                }
                TokenKind::RBrace => {
                    self.advance();
                    if brace_depth > 0 {
                        brace_depth -= 1;
                        if brace_depth == 0 {
                            self.skip_semis();
                            return;
                        }
                    }
                }
                TokenKind::Func | TokenKind::Var | TokenKind::Const | TokenKind::Type
                    if brace_depth == 0 =>
                {
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // =========================================================================
    // Token Navigation
    // =========================================================================

    fn current(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .unwrap_or_else(|| self.tokens.last().unwrap())
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn advance(&mut self) -> &Token {
        if !self.at_end() {
            self.pos += 1;
        }
        self.tokens.get(self.pos.saturating_sub(1)).unwrap()
    }

    /// Span of the most recently consumed token.
    fn prev_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<&Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::expected(
                kind.display_name(),
                self.current_kind(),
                self.current().span,
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.current_kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(ParseError::expected("a name", &other, self.current().span)),
        }
    }

    fn skip_semis(&mut self) {
        while self.check(&TokenKind::Semi) {
            self.advance();
        }
    }

    fn expect_terminator(&mut self) -> Result<(), ParseError> {
        if self.check(&TokenKind::Semi) {
            self.advance();
            self.skip_semis();
            Ok(())
        } else if self.check(&TokenKind::Eof)
            || self.check(&TokenKind::RBrace)
            || self.check(&TokenKind::Case)
            || self.check(&TokenKind::Default)
        {
            Ok(())
        } else {
            Err(ParseError::expected(
                "';' or newline",
                self.current_kind(),
                self.current().span,
            ))
        }
    }

    // =========================================================================
    // Entry Points
    // =========================================================================

    /// Parse a whole source file: package clause, imports, declarations.
    pub fn parse(&mut self) -> FileResult {
        let file = self.parse_file_inner();
        FileResult {
            file,
            errors: std::mem::take(&mut self.errors),
        }
    }

    /// Parse a bare statement list (REPL input, injected snippets).
    pub fn parse_stmts(&mut self) -> StmtResult {
        let mut stmts = Vec::new();
        self.skip_semis();
        while !self.at_end() {
            match self.parse_stmt() {
                Ok(stmt) => {
                    stmts.push(stmt);
                    if let Err(e) = self.expect_terminator() {
                        if !self.record_error(e) {
                            break;
                        }
                        self.advance();
                    }
                }
                Err(e) => {
                    if !self.record_error(e) {
                        break;
                    }
                    self.advance();
                }
            }
            self.skip_semis();
        }
        StmtResult {
            stmts,
            errors: std::mem::take(&mut self.errors),
        }
    }

    fn parse_file_inner(&mut self) -> Option<File> {
        self.skip_semis();
        if let Err(e) = self.expect(&TokenKind::Package) {
            self.record_error(e);
            return None;
        }
        let package = match self.expect_ident() {
            Ok(name) => name,
            Err(e) => {
                self.record_error(e);
                return None;
            }
        };
        self.skip_semis();

        let mut imports = Vec::new();
        while self.check(&TokenKind::Import) {
            self.advance();
            if self.match_token(&TokenKind::LParen) {
                self.skip_semis();
                while !self.check(&TokenKind::RParen) && !self.at_end() {
                    match self.parse_import_entry() {
                        Ok(imp) => imports.push(imp),
                        Err(e) => {
                            if !self.record_error(e) {
                                return None;
                            }
                            self.advance();
                        }
                    }
                    self.skip_semis();
                }
                let _ = self.expect(&TokenKind::RParen);
            } else {
                match self.parse_import_entry() {
                    Ok(imp) => imports.push(imp),
                    Err(e) => {
                        if !self.record_error(e) {
                            return None;
                        }
                    }
                }
            }
            self.skip_semis();
        }

        let mut decls = Vec::new();
        self.skip_semis();
        while !self.at_end() {
            if self.errors.len() >= MAX_ERRORS {
                break;
            }
            match self.parse_decl() {
                Ok(mut batch) => decls.append(&mut batch),
                Err(e) => {
                    self.record_error(e);
                    self.synchronize();
                }
            }
            self.skip_semis();
        }

        Some(File {
            package,
            imports,
            decls,
        })
    }

    fn parse_import_entry(&mut self) -> Result<ImportDecl, ParseError> {
        let start = self.current_span();
        let name = match self.current_kind().clone() {
            TokenKind::Ident(n) => {
                self.advance();
                Some(n)
            }
            TokenKind::Dot => {
                self.advance();
                Some(".".to_string())
            }
            _ => None,
        };
        match self.current_kind().clone() {
            TokenKind::String(path) => {
                let end = self.current_span();
                self.advance();
                Ok(ImportDecl {
                    name,
                    path,
                    span: start.to(end),
                })
            }
            other => Err(ParseError::expected(
                "an import path",
                &other,
                self.current_span(),
            )),
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn parse_decl(&mut self) -> Result<Vec<Decl>, ParseError> {
        match self.current_kind() {
            TokenKind::Func => Ok(vec![self.parse_fn_decl()?]),
            TokenKind::Var => self.parse_value_decls(false),
            TokenKind::Const => self.parse_value_decls(true),
            TokenKind::Type => self.parse_type_decls(),
            other => Err(ParseError::expected(
                "a declaration",
                &other.clone(),
                self.current_span(),
            )),
        }
    }

    fn parse_fn_decl(&mut self) -> Result<Decl, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::Func)?;

        // Method receiver
        let recv = if self.check(&TokenKind::LParen) {
            self.advance();
            let params = self.parse_param_list()?;
            self.expect(&TokenKind::RParen)?;
            params.into_iter().next()
        } else {
            None
        };

        let name = self.expect_ident()?;
        let (params, results) = self.parse_signature()?;
        let body = self.parse_block()?;
        let end = self.prev_span();

        Ok(Decl {
            kind: DeclKind::Func(FnDecl {
                name,
                recv,
                params,
                results,
                body,
            }),
            span: start.to(end),
        })
    }

    fn parse_value_decls(&mut self, is_const: bool) -> Result<Vec<Decl>, ParseError> {
        let start = self.current_span();
        self.advance(); // var / const
        let mut specs = Vec::new();
        if self.match_token(&TokenKind::LParen) {
            self.skip_semis();
            while !self.check(&TokenKind::RParen) && !self.at_end() {
                specs.push(self.parse_value_spec()?);
                self.skip_semis();
            }
            self.expect(&TokenKind::RParen)?;
        } else {
            specs.push(self.parse_value_spec()?);
        }
        let end = self.prev_span();
        Ok(specs
            .into_iter()
            .map(|spec| Decl {
                kind: if is_const {
                    DeclKind::Const(spec)
                } else {
                    DeclKind::Var(spec)
                },
                span: start.to(end),
            })
            .collect())
    }

    fn parse_value_spec(&mut self) -> Result<ValueDecl, ParseError> {
        let mut names = vec![self.expect_ident()?];
        while self.match_token(&TokenKind::Comma) {
            names.push(self.expect_ident()?);
        }
        let ty = if !self.check(&TokenKind::Eq)
            && !self.check(&TokenKind::Semi)
            && !self.check(&TokenKind::RParen)
            && !self.check(&TokenKind::Eof)
        {
            Some(self.parse_type()?)
        } else {
            None
        };
        let mut values = Vec::new();
        if self.match_token(&TokenKind::Eq) {
            values.push(self.parse_expr()?);
            while self.match_token(&TokenKind::Comma) {
                values.push(self.parse_expr()?);
            }
        }
        Ok(ValueDecl { names, ty, values })
    }

    fn parse_type_decls(&mut self) -> Result<Vec<Decl>, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::Type)?;
        let mut decls = Vec::new();
        if self.match_token(&TokenKind::LParen) {
            self.skip_semis();
            while !self.check(&TokenKind::RParen) && !self.at_end() {
                let name = self.expect_ident()?;
                let ty = self.parse_type()?;
                let end = self.prev_span();
                decls.push(Decl {
                    kind: DeclKind::Type(TypeDecl { name, ty }),
                    span: start.to(end),
                });
                self.skip_semis();
            }
            self.expect(&TokenKind::RParen)?;
        } else {
            let name = self.expect_ident()?;
            let ty = self.parse_type()?;
            let end = self.prev_span();
            decls.push(Decl {
                kind: DeclKind::Type(TypeDecl { name, ty }),
                span: start.to(end),
            });
        }
        Ok(decls)
    }

    /// Parse `(params) results` after a function name.
    fn parse_signature(&mut self) -> Result<(Vec<Param>, Vec<Param>), ParseError> {
        self.expect(&TokenKind::LParen)?;
        let params = self.parse_param_list()?;
        self.expect(&TokenKind::RParen)?;

        let results = if self.match_token(&TokenKind::LParen) {
            let r = self.parse_param_list()?;
            self.expect(&TokenKind::RParen)?;
            r
        } else if self.starts_type() {
            vec![Param {
                names: vec![],
                ty: self.parse_type()?,
            }]
        } else {
            vec![]
        };
        Ok((params, results))
    }

    /// Parse the comma-separated entries inside a parameter list. Groups of
    /// names sharing one type (`a, b int`) are resolved after the fact.
    fn parse_param_list(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut entries: Vec<(Expr, Option<Expr>)> = Vec::new();
        if self.check(&TokenKind::RParen) {
            return Ok(vec![]);
        }
        loop {
            if self.match_token(&TokenKind::Ellipsis) {
                // Unnamed variadic type
                let ty = self.parse_type()?;
                entries.push((ty, None));
            } else {
                let first = self.parse_type()?;
                if self.match_token(&TokenKind::Ellipsis) {
                    let ty = self.parse_type()?;
                    entries.push((first, Some(ty)));
                } else if self.starts_type() {
                    let ty = self.parse_type()?;
                    entries.push((first, Some(ty)));
                } else {
                    entries.push((first, None));
                }
            }
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        let named = entries.iter().any(|(_, t)| t.is_some());
        if !named {
            return Ok(entries
                .into_iter()
                .map(|(ty, _)| Param { names: vec![], ty })
                .collect());
        }

        let mut params = Vec::new();
        let mut pending: Vec<String> = Vec::new();
        for (e, t) in entries {
            let name = match &e.kind {
                ExprKind::Ident(n) => n.clone(),
                _ => {
                    return Err(ParseError::new(
                        "expected parameter name".to_string(),
                        e.span,
                        None,
                    ))
                }
            };
            match t {
                None => pending.push(name),
                Some(ty) => {
                    pending.push(name);
                    params.push(Param {
                        names: std::mem::take(&mut pending),
                        ty,
                    });
                }
            }
        }
        if !pending.is_empty() {
            return Err(ParseError::new(
                "missing parameter type".to_string(),
                self.current_span(),
                None,
            ));
        }
        Ok(params)
    }

    // =========================================================================
    // Types
    // =========================================================================

    /// Whether the current token can begin a type expression.
    fn starts_type(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Ident(_)
                | TokenKind::LBracket
                | TokenKind::Map
                | TokenKind::Chan
                | TokenKind::Arrow
                | TokenKind::Star
                | TokenKind::Struct
                | TokenKind::Interface
                | TokenKind::Func
                | TokenKind::LParen
        )
    }

    fn parse_type(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_span();
        match self.current_kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                let mut expr = Expr {
                    kind: ExprKind::Ident(name),
                    span: start,
                };
                // Qualified type pkg.T
                if self.check(&TokenKind::Dot) {
                    self.advance();
                    let sel = self.expect_ident()?;
                    let end = self.prev_span();
                    expr = Expr {
                        kind: ExprKind::Selector {
                            x: Box::new(expr),
                            sel,
                        },
                        span: start.to(end),
                    };
                }
                Ok(expr)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_type()?;
                let end = self.expect(&TokenKind::RParen)?.span;
                Ok(Expr {
                    kind: ExprKind::Paren(Box::new(inner)),
                    span: start.to(end),
                })
            }
            TokenKind::Star => {
                self.advance();
                let inner = self.parse_type()?;
                let span = start.to(inner.span);
                Ok(Expr {
                    kind: ExprKind::Unary {
                        op: UnaryOp::Deref,
                        x: Box::new(inner),
                    },
                    span,
                })
            }
            TokenKind::LBracket => {
                self.advance();
                let len = if self.check(&TokenKind::RBracket) {
                    None
                } else {
                    Some(Box::new(self.parse_expr()?))
                };
                self.expect(&TokenKind::RBracket)?;
                let elem = self.parse_type()?;
                let span = start.to(elem.span);
                Ok(Expr {
                    kind: ExprKind::ArrayType {
                        len,
                        elem: Box::new(elem),
                    },
                    span,
                })
            }
            TokenKind::Map => {
                self.advance();
                self.expect(&TokenKind::LBracket)?;
                let key = self.parse_type()?;
                self.expect(&TokenKind::RBracket)?;
                let value = self.parse_type()?;
                let span = start.to(value.span);
                Ok(Expr {
                    kind: ExprKind::MapType {
                        key: Box::new(key),
                        value: Box::new(value),
                    },
                    span,
                })
            }
            TokenKind::Chan => {
                self.advance();
                // Directionality is parsed and discarded
                self.match_token(&TokenKind::Arrow);
                let elem = self.parse_type()?;
                let span = start.to(elem.span);
                Ok(Expr {
                    kind: ExprKind::ChanType {
                        elem: Box::new(elem),
                    },
                    span,
                })
            }
            TokenKind::Arrow => {
                self.advance();
                self.expect(&TokenKind::Chan)?;
                let elem = self.parse_type()?;
                let span = start.to(elem.span);
                Ok(Expr {
                    kind: ExprKind::ChanType {
                        elem: Box::new(elem),
                    },
                    span,
                })
            }
            TokenKind::Struct => {
                self.advance();
                self.expect(&TokenKind::LBrace)?;
                let mut fields = Vec::new();
                self.skip_semis();
                while !self.check(&TokenKind::RBrace) && !self.at_end() {
                    fields.push(self.parse_field()?);
                    self.skip_semis();
                }
                let end = self.expect(&TokenKind::RBrace)?.span;
                Ok(Expr {
                    kind: ExprKind::StructType { fields },
                    span: start.to(end),
                })
            }
            TokenKind::Interface => {
                self.advance();
                self.expect(&TokenKind::LBrace)?;
                let mut methods = Vec::new();
                self.skip_semis();
                while !self.check(&TokenKind::RBrace) && !self.at_end() {
                    let name = self.expect_ident()?;
                    let (params, results) = self.parse_signature()?;
                    let span = self.prev_span();
                    methods.push(Field {
                        names: vec![name],
                        ty: Expr {
                            kind: ExprKind::FuncType { params, results },
                            span,
                        },
                    });
                    self.skip_semis();
                }
                let end = self.expect(&TokenKind::RBrace)?.span;
                Ok(Expr {
                    kind: ExprKind::InterfaceType { methods },
                    span: start.to(end),
                })
            }
            TokenKind::Func => {
                self.advance();
                let (params, results) = self.parse_signature()?;
                let end = self.prev_span();
                Ok(Expr {
                    kind: ExprKind::FuncType { params, results },
                    span: start.to(end),
                })
            }
            other => Err(ParseError::expected("a type", &other, self.current_span())),
        }
    }

    /// A struct field: grouped names and a type, or an embedded type.
    fn parse_field(&mut self) -> Result<Field, ParseError> {
        let mut names = vec![self.expect_ident()?];
        while self.match_token(&TokenKind::Comma) {
            names.push(self.expect_ident()?);
        }
        if names.len() == 1 && (self.check(&TokenKind::Semi) || self.check(&TokenKind::RBrace)) {
            // Embedded field
            let span = self.prev_span();
            let ty = Expr {
                kind: ExprKind::Ident(names.pop().unwrap()),
                span,
            };
            return Ok(Field { names: vec![], ty });
        }
        if names.len() == 1 && self.check(&TokenKind::Dot) {
            // Embedded qualified field
            self.advance();
            let sel = self.expect_ident()?;
            let span = self.prev_span();
            let ty = Expr {
                kind: ExprKind::Selector {
                    x: Box::new(Expr {
                        kind: ExprKind::Ident(names.pop().unwrap()),
                        span,
                    }),
                    sel,
                },
                span,
            };
            return Ok(Field { names: vec![], ty });
        }
        let ty = self.parse_type()?;
        Ok(Field { names, ty })
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(&TokenKind::LBrace)?;
        let saved = self.allow_brace_expr;
        self.allow_brace_expr = true;
        let stmts = self.parse_stmt_list();
        self.allow_brace_expr = saved;
        self.expect(&TokenKind::RBrace)?;
        Ok(stmts)
    }

    fn parse_stmt_list(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        self.skip_semis();
        while !self.check(&TokenKind::RBrace)
            && !self.check(&TokenKind::Case)
            && !self.check(&TokenKind::Default)
            && !self.at_end()
        {
            if self.errors.len() >= MAX_ERRORS {
                break;
            }
            match self.parse_stmt() {
                Ok(stmt) => {
                    stmts.push(stmt);
                    if let Err(e) = self.expect_terminator() {
                        self.record_error(e);
                        self.advance();
                    }
                }
                Err(e) => {
                    self.record_error(e);
                    // Skip to the next statement boundary
                    while !self.check(&TokenKind::Semi)
                        && !self.check(&TokenKind::RBrace)
                        && !self.at_end()
                    {
                        self.advance();
                    }
                }
            }
            self.skip_semis();
        }
        stmts
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        match self.current_kind() {
            TokenKind::Var | TokenKind::Const => {
                self.advance();
                let spec = self.parse_value_spec()?;
                let end = self.prev_span();
                Ok(Stmt {
                    kind: StmtKind::Var {
                        names: spec.names,
                        ty: spec.ty,
                        values: spec.values,
                    },
                    span: start.to(end),
                })
            }
            TokenKind::Return => {
                self.advance();
                let mut results = Vec::new();
                if !self.check(&TokenKind::Semi)
                    && !self.check(&TokenKind::RBrace)
                    && !self.at_end()
                {
                    results.push(self.parse_expr()?);
                    while self.match_token(&TokenKind::Comma) {
                        results.push(self.parse_expr()?);
                    }
                }
                let end = self.prev_span();
                Ok(Stmt {
                    kind: StmtKind::Return(results),
                    span: start.to(end),
                })
            }
            TokenKind::Break => {
                self.advance();
                Ok(Stmt {
                    kind: StmtKind::Break,
                    span: start,
                })
            }
            TokenKind::Continue => {
                self.advance();
                Ok(Stmt {
                    kind: StmtKind::Continue,
                    span: start,
                })
            }
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::Switch => self.parse_switch_stmt(),
            TokenKind::Select => self.parse_select_stmt(),
            TokenKind::Go => {
                self.advance();
                let call = self.parse_expr()?;
                let span = start.to(call.span);
                Ok(Stmt {
                    kind: StmtKind::Go(call),
                    span,
                })
            }
            TokenKind::Defer => {
                self.advance();
                let call = self.parse_expr()?;
                let span = start.to(call.span);
                Ok(Stmt {
                    kind: StmtKind::Defer(call),
                    span,
                })
            }
            TokenKind::LBrace => {
                let body = self.parse_block()?;
                let end = self.prev_span();
                Ok(Stmt {
                    kind: StmtKind::Block(body),
                    span: start.to(end),
                })
            }
            _ => match self.parse_simple_stmt(false)? {
                SimpleStmt::Stmt(s) => Ok(s),
                SimpleStmt::Range { .. } => Err(ParseError::new(
                    "range is only valid in a for clause".to_string(),
                    start,
                    None,
                )),
            },
        }
    }

    /// Expression statement, send, inc/dec, assignment, or short declaration.
    fn parse_simple_stmt(&mut self, allow_range: bool) -> Result<SimpleStmt, ParseError> {
        let start = self.current_span();
        let mut lhs = vec![self.parse_expr()?];
        while self.match_token(&TokenKind::Comma) {
            lhs.push(self.parse_expr()?);
        }

        if lhs.len() == 1 && self.check(&TokenKind::Arrow) {
            self.advance();
            let value = self.parse_expr()?;
            let span = start.to(value.span);
            return Ok(SimpleStmt::Stmt(Stmt {
                kind: StmtKind::Send {
                    chan: lhs.pop().unwrap(),
                    value,
                },
                span,
            }));
        }

        if lhs.len() == 1 && (self.check(&TokenKind::Inc) || self.check(&TokenKind::Dec)) {
            let inc = self.check(&TokenKind::Inc);
            let end = self.advance().span;
            return Ok(SimpleStmt::Stmt(Stmt {
                kind: StmtKind::IncDec {
                    x: lhs.pop().unwrap(),
                    inc,
                },
                span: start.to(end),
            }));
        }

        if let Some(op) = assign_op(self.current_kind()) {
            self.advance();
            if allow_range && self.check(&TokenKind::Range) {
                self.advance();
                let x = self.parse_expr()?;
                let mut names = lhs.iter().map(ident_name);
                let key = names.next().transpose()?;
                let value = names.next().transpose()?;
                if lhs.len() > 2 {
                    return Err(ParseError::new(
                        "too many variables in range clause".to_string(),
                        start,
                        None,
                    ));
                }
                return Ok(SimpleStmt::Range { key, value, x });
            }
            let mut rhs = vec![self.parse_expr()?];
            while self.match_token(&TokenKind::Comma) {
                rhs.push(self.parse_expr()?);
            }
            let end = rhs.last().map(|e| e.span).unwrap_or(start);
            return Ok(SimpleStmt::Stmt(Stmt {
                kind: StmtKind::Assign { lhs, rhs, op },
                span: start.to(end),
            }));
        }

        if lhs.len() > 1 {
            return Err(ParseError::new(
                "expected assignment after expression list".to_string(),
                self.current_span(),
                None,
            ));
        }
        let expr = lhs.pop().unwrap();
        let span = expr.span;
        Ok(SimpleStmt::Stmt(Stmt {
            kind: StmtKind::Expr(expr),
            span,
        }))
    }

    fn parse_if_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::If)?;

        let saved = self.allow_brace_expr;
        self.allow_brace_expr = false;
        let first = self.parse_simple_stmt(false)?;
        let (init, cond) = if self.check(&TokenKind::Semi) {
            self.advance();
            let cond_stmt = self.parse_simple_stmt(false)?;
            (
                Some(Box::new(expect_stmt(first)?)),
                expect_cond(cond_stmt)?,
            )
        } else {
            (None, expect_cond(first)?)
        };
        self.allow_brace_expr = saved;

        let then = self.parse_block()?;
        let els = if self.match_token(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                Some(Box::new(self.parse_if_stmt()?))
            } else {
                let body_start = self.current_span();
                let body = self.parse_block()?;
                let end = self.prev_span();
                Some(Box::new(Stmt {
                    kind: StmtKind::Block(body),
                    span: body_start.to(end),
                }))
            }
        } else {
            None
        };
        let end = self.prev_span();
        Ok(Stmt {
            kind: StmtKind::If {
                init,
                cond,
                then,
                els,
            },
            span: start.to(end),
        })
    }

    fn parse_for_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::For)?;

        let saved = self.allow_brace_expr;
        self.allow_brace_expr = false;

        // for { ... }
        if self.check(&TokenKind::LBrace) {
            self.allow_brace_expr = saved;
            let body = self.parse_block()?;
            let end = self.prev_span();
            return Ok(Stmt {
                kind: StmtKind::For {
                    init: None,
                    cond: None,
                    post: None,
                    body,
                },
                span: start.to(end),
            });
        }

        // for range x { ... }
        if self.check(&TokenKind::Range) {
            self.advance();
            let x = self.parse_expr()?;
            self.allow_brace_expr = saved;
            let body = self.parse_block()?;
            let end = self.prev_span();
            return Ok(Stmt {
                kind: StmtKind::Range {
                    key: None,
                    value: None,
                    x,
                    body,
                },
                span: start.to(end),
            });
        }

        let mut init: Option<Box<Stmt>> = None;
        let mut cond: Option<Expr> = None;
        let mut post: Option<Box<Stmt>> = None;

        if !self.check(&TokenKind::Semi) {
            match self.parse_simple_stmt(true)? {
                SimpleStmt::Range { key, value, x } => {
                    self.allow_brace_expr = saved;
                    let body = self.parse_block()?;
                    let end = self.prev_span();
                    return Ok(Stmt {
                        kind: StmtKind::Range {
                            key,
                            value,
                            x,
                            body,
                        },
                        span: start.to(end),
                    });
                }
                SimpleStmt::Stmt(s) => {
                    if self.check(&TokenKind::LBrace) {
                        // Condition-only loop
                        self.allow_brace_expr = saved;
                        let body = self.parse_block()?;
                        let end = self.prev_span();
                        return Ok(Stmt {
                            kind: StmtKind::For {
                                init: None,
                                cond: Some(expect_cond(SimpleStmt::Stmt(s))?),
                                post: None,
                                body,
                            },
                            span: start.to(end),
                        });
                    }
                    init = Some(Box::new(s));
                }
            }
        }

        self.expect(&TokenKind::Semi)?;
        if !self.check(&TokenKind::Semi) {
            cond = Some(self.parse_expr()?);
        }
        self.expect(&TokenKind::Semi)?;
        if !self.check(&TokenKind::LBrace) {
            match self.parse_simple_stmt(false)? {
                SimpleStmt::Stmt(s) => post = Some(Box::new(s)),
                SimpleStmt::Range { .. } => {
                    return Err(ParseError::new(
                        "range is not valid as a post statement".to_string(),
                        self.current_span(),
                        None,
                    ))
                }
            }
        }
        self.allow_brace_expr = saved;
        let body = self.parse_block()?;
        let end = self.prev_span();
        Ok(Stmt {
            kind: StmtKind::For {
                init,
                cond,
                post,
                body,
            },
            span: start.to(end),
        })
    }

    fn parse_switch_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::Switch)?;

        let saved = self.allow_brace_expr;
        self.allow_brace_expr = false;

        let mut init: Option<Box<Stmt>> = None;
        let mut guard: Option<Stmt> = None;

        if !self.check(&TokenKind::LBrace) {
            let first = self.parse_simple_stmt(false)?;
            let first = expect_stmt(first)?;
            if self.check(&TokenKind::Semi) {
                self.advance();
                init = Some(Box::new(first));
                if !self.check(&TokenKind::LBrace) {
                    guard = Some(expect_stmt(self.parse_simple_stmt(false)?)?);
                }
            } else {
                guard = Some(first);
            }
        }
        self.allow_brace_expr = saved;

        // A guard of the form `x.(type)` or `v := x.(type)` selects the
        // type-switch interpretation; any other expression is the tag.
        enum Guard {
            None,
            Tag(Expr),
            TypeSwitch { binding: Option<String>, x: Expr },
        }
        let guard = match guard {
            None => Guard::None,
            Some(stmt) => {
                let span = stmt.span;
                match stmt.kind {
                    StmtKind::Expr(Expr {
                        kind: ExprKind::TypeAssert { x, ty: None },
                        ..
                    }) => Guard::TypeSwitch {
                        binding: None,
                        x: *x,
                    },
                    StmtKind::Assign { lhs, mut rhs, op }
                        if op == AssignOp::Define
                            && lhs.len() == 1
                            && rhs.len() == 1
                            && matches!(rhs[0].kind, ExprKind::TypeAssert { ty: None, .. }) =>
                    {
                        let name = ident_name(&lhs[0])?;
                        match rhs.pop().unwrap().kind {
                            ExprKind::TypeAssert { x, .. } => Guard::TypeSwitch {
                                binding: Some(name),
                                x: *x,
                            },
                            _ => unreachable!(),
                        }
                    }
                    StmtKind::Expr(e) => Guard::Tag(e),
                    _ => {
                        return Err(ParseError::new(
                            "expected expression as switch tag".to_string(),
                            span,
                            None,
                        ))
                    }
                }
            }
        };

        self.expect(&TokenKind::LBrace)?;
        let mut cases = Vec::new();
        self.skip_semis();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            let list = if self.match_token(&TokenKind::Case) {
                let mut list = vec![self.parse_expr()?];
                while self.match_token(&TokenKind::Comma) {
                    list.push(self.parse_expr()?);
                }
                list
            } else {
                self.expect(&TokenKind::Default)?;
                vec![]
            };
            self.expect(&TokenKind::Colon)?;
            let body = self.parse_stmt_list();
            cases.push(CaseClause { list, body });
        }
        let end = self.expect(&TokenKind::RBrace)?.span;

        match guard {
            Guard::TypeSwitch { binding, x } => Ok(Stmt {
                kind: StmtKind::TypeSwitch {
                    init,
                    binding,
                    x,
                    cases,
                },
                span: start.to(end),
            }),
            Guard::Tag(tag) => Ok(Stmt {
                kind: StmtKind::Switch {
                    init,
                    tag: Some(tag),
                    cases,
                },
                span: start.to(end),
            }),
            Guard::None => Ok(Stmt {
                kind: StmtKind::Switch {
                    init,
                    tag: None,
                    cases,
                },
                span: start.to(end),
            }),
        }
    }

    fn parse_select_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.current_span();
        self.expect(&TokenKind::Select)?;
        self.expect(&TokenKind::LBrace)?;
        let mut cases = Vec::new();
        self.skip_semis();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            let comm = if self.match_token(&TokenKind::Case) {
                match self.parse_simple_stmt(false)? {
                    SimpleStmt::Stmt(s) => Some(Box::new(s)),
                    SimpleStmt::Range { .. } => {
                        return Err(ParseError::new(
                            "range is not valid in a select clause".to_string(),
                            self.current_span(),
                            None,
                        ))
                    }
                }
            } else {
                self.expect(&TokenKind::Default)?;
                None
            };
            self.expect(&TokenKind::Colon)?;
            let body = self.parse_stmt_list();
            cases.push(CommClause { comm, body });
        }
        let end = self.expect(&TokenKind::RBrace)?.span;
        Ok(Stmt {
            kind: StmtKind::Select { cases },
            span: start.to(end),
        })
    }

    // =========================================================================
    // Expressions (Pratt)
    // =========================================================================

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(1)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let Some((op, prec)) = binop(self.current_kind()) else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.advance();
            let right = self.parse_binary(prec + 1)?;
            let span = left.span.to(right.span);
            left = Expr {
                kind: ExprKind::Binary {
                    op,
                    x: Box::new(left),
                    y: Box::new(right),
                },
                span,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_span();
        let op = match self.current_kind() {
            TokenKind::Plus => Some(UnaryOp::Pos),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Amp => Some(UnaryOp::Addr),
            TokenKind::Star => Some(UnaryOp::Deref),
            TokenKind::Arrow => Some(UnaryOp::Recv),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let x = self.parse_unary()?;
            let span = start.to(x.span);
            return Ok(Expr {
                kind: ExprKind::Unary { op, x: Box::new(x) },
                span,
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_operand()?;
        loop {
            match self.current_kind() {
                TokenKind::Dot => {
                    self.advance();
                    if self.match_token(&TokenKind::LParen) {
                        // Type assertion: x.(T) or x.(type)
                        let ty = if self.check(&TokenKind::Type) {
                            self.advance();
                            None
                        } else {
                            Some(Box::new(self.parse_type()?))
                        };
                        let end = self.expect(&TokenKind::RParen)?.span;
                        let span = expr.span.to(end);
                        expr = Expr {
                            kind: ExprKind::TypeAssert {
                                x: Box::new(expr),
                                ty,
                            },
                            span,
                        };
                    } else {
                        let sel = self.expect_ident()?;
                        let end = self.prev_span();
                        let span = expr.span.to(end);
                        expr = Expr {
                            kind: ExprKind::Selector {
                                x: Box::new(expr),
                                sel,
                            },
                            span,
                        };
                    }
                }
                TokenKind::LBracket => {
                    self.advance();
                    let saved = self.allow_brace_expr;
                    self.allow_brace_expr = true;
                    let low = if self.check(&TokenKind::Colon) {
                        None
                    } else {
                        Some(Box::new(self.parse_expr()?))
                    };
                    if self.match_token(&TokenKind::Colon) {
                        let high = if self.check(&TokenKind::RBracket) {
                            None
                        } else {
                            Some(Box::new(self.parse_expr()?))
                        };
                        let end = self.expect(&TokenKind::RBracket)?.span;
                        self.allow_brace_expr = saved;
                        let span = expr.span.to(end);
                        expr = Expr {
                            kind: ExprKind::Slice {
                                x: Box::new(expr),
                                low,
                                high,
                            },
                            span,
                        };
                    } else {
                        let end = self.expect(&TokenKind::RBracket)?.span;
                        self.allow_brace_expr = saved;
                        let span = expr.span.to(end);
                        let index = low.ok_or_else(|| {
                            ParseError::new("expected index expression".to_string(), span, None)
                        })?;
                        expr = Expr {
                            kind: ExprKind::Index {
                                x: Box::new(expr),
                                index,
                            },
                            span,
                        };
                    }
                }
                TokenKind::LParen => {
                    self.advance();
                    let saved = self.allow_brace_expr;
                    self.allow_brace_expr = true;
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        args.push(self.parse_expr()?);
                        while self.match_token(&TokenKind::Comma) {
                            if self.check(&TokenKind::RParen) {
                                break; // trailing comma
                            }
                            args.push(self.parse_expr()?);
                        }
                    }
                    let end = self.expect(&TokenKind::RParen)?.span;
                    self.allow_brace_expr = saved;
                    let span = expr.span.to(end);
                    expr = Expr {
                        kind: ExprKind::Call {
                            fun: Box::new(expr),
                            args,
                        },
                        span,
                    };
                }
                TokenKind::LBrace if self.allow_brace_expr && is_literal_head(&expr) => {
                    expr = self.parse_composite_lit(expr)?;
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_composite_lit(&mut self, head: Expr) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LBrace)?;
        let saved = self.allow_brace_expr;
        self.allow_brace_expr = true;
        let mut elts = Vec::new();
        self.skip_semis();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            let elt = self.parse_expr()?;
            if self.match_token(&TokenKind::Colon) {
                let value = self.parse_expr()?;
                let span = elt.span.to(value.span);
                elts.push(Expr {
                    kind: ExprKind::KeyValue {
                        key: Box::new(elt),
                        value: Box::new(value),
                    },
                    span,
                });
            } else {
                elts.push(elt);
            }
            if !self.match_token(&TokenKind::Comma) {
                self.skip_semis();
                break;
            }
            self.skip_semis();
        }
        let end = self.expect(&TokenKind::RBrace)?.span;
        self.allow_brace_expr = saved;
        let span = head.span.to(end);
        Ok(Expr {
            kind: ExprKind::CompositeLit {
                ty: Box::new(head),
                elts,
            },
            span,
        })
    }

    fn parse_operand(&mut self) -> Result<Expr, ParseError> {
        let span = self.current_span();
        match self.current_kind().clone() {
            TokenKind::Int(v) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Int(v),
                    span,
                })
            }
            TokenKind::UintBig(v) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::UintBig(v),
                    span,
                })
            }
            TokenKind::Float(v) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Float(v),
                    span,
                })
            }
            TokenKind::Imag(v) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Imag(v),
                    span,
                })
            }
            TokenKind::Char(c) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Char(c),
                    span,
                })
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::String(s),
                    span,
                })
            }
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::Ident(name),
                    span,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let saved = self.allow_brace_expr;
                self.allow_brace_expr = true;
                let inner = self.parse_expr()?;
                let end = self.expect(&TokenKind::RParen)?.span;
                self.allow_brace_expr = saved;
                Ok(Expr {
                    kind: ExprKind::Paren(Box::new(inner)),
                    span: span.to(end),
                })
            }
            TokenKind::Func => {
                self.advance();
                let (params, results) = self.parse_signature()?;
                if self.check(&TokenKind::LBrace) {
                    let body = self.parse_block()?;
                    let end = self.prev_span();
                    Ok(Expr {
                        kind: ExprKind::FuncLit(FuncLit {
                            params,
                            results,
                            body,
                        }),
                        span: span.to(end),
                    })
                } else {
                    let end = self.prev_span();
                    Ok(Expr {
                        kind: ExprKind::FuncType { params, results },
                        span: span.to(end),
                    })
                }
            }
            TokenKind::LBracket
            | TokenKind::Map
            | TokenKind::Chan
            | TokenKind::Struct
            | TokenKind::Interface => self.parse_type(),
            other => Err(ParseError::expected("an expression", &other, span)),
        }
    }
}

/// Whether an expression can head a composite literal.
fn is_literal_head(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Ident(_)
            | ExprKind::Selector { .. }
            | ExprKind::ArrayType { .. }
            | ExprKind::MapType { .. }
            | ExprKind::StructType { .. }
    )
}

fn ident_name(expr: &Expr) -> Result<String, ParseError> {
    match &expr.kind {
        ExprKind::Ident(n) => Ok(n.clone()),
        _ => Err(ParseError::new(
            "expected identifier".to_string(),
            expr.span,
            None,
        )),
    }
}

fn expect_stmt(s: SimpleStmt) -> Result<Stmt, ParseError> {
    match s {
        SimpleStmt::Stmt(stmt) => Ok(stmt),
        SimpleStmt::Range { .. } => Err(ParseError::new(
            "range is only valid in a for clause".to_string(),
            Span::default(),
            None,
        )),
    }
}

fn expect_cond(s: SimpleStmt) -> Result<Expr, ParseError> {
    match expect_stmt(s)? {
        Stmt {
            kind: StmtKind::Expr(e),
            ..
        } => Ok(e),
        other => Err(ParseError::new(
            "expected a boolean condition".to_string(),
            other.span,
            Some("conditions must be expressions, not statements".to_string()),
        )),
    }
}

/// Binary operator and its precedence (higher binds tighter).
fn binop(kind: &TokenKind) -> Option<(BinOp, u8)> {
    Some(match kind {
        TokenKind::PipePipe => (BinOp::LOr, 1),
        TokenKind::AmpAmp => (BinOp::LAnd, 2),
        TokenKind::EqEq => (BinOp::Eql, 3),
        TokenKind::BangEq => (BinOp::Neq, 3),
        TokenKind::Lt => (BinOp::Lss, 3),
        TokenKind::LtEq => (BinOp::Leq, 3),
        TokenKind::Gt => (BinOp::Gtr, 3),
        TokenKind::GtEq => (BinOp::Geq, 3),
        TokenKind::Plus => (BinOp::Add, 4),
        TokenKind::Minus => (BinOp::Sub, 4),
        TokenKind::Pipe => (BinOp::Or, 4),
        TokenKind::Caret => (BinOp::Xor, 4),
        TokenKind::Star => (BinOp::Mul, 5),
        TokenKind::Slash => (BinOp::Quo, 5),
        TokenKind::Percent => (BinOp::Rem, 5),
        TokenKind::Shl => (BinOp::Shl, 5),
        TokenKind::Shr => (BinOp::Shr, 5),
        TokenKind::Amp => (BinOp::And, 5),
        TokenKind::AndNot => (BinOp::AndNot, 5),
        _ => return None,
    })
}

fn assign_op(kind: &TokenKind) -> Option<AssignOp> {
    Some(match kind {
        TokenKind::Eq => AssignOp::Assign,
        TokenKind::ColonEq => AssignOp::Define,
        TokenKind::PlusEq => AssignOp::Add,
        TokenKind::MinusEq => AssignOp::Sub,
        TokenKind::StarEq => AssignOp::Mul,
        TokenKind::SlashEq => AssignOp::Quo,
        TokenKind::PercentEq => AssignOp::Rem,
        TokenKind::AmpEq => AssignOp::And,
        TokenKind::PipeEq => AssignOp::Or,
        TokenKind::CaretEq => AssignOp::Xor,
        TokenKind::AndNotEq => AssignOp::AndNot,
        TokenKind::ShlEq => AssignOp::Shl,
        TokenKind::ShrEq => AssignOp::Shr,
        _ => return None,
    })
}

/// Result of parsing a file: the file (if the header parsed) plus errors.
#[derive(Debug)]
pub struct FileResult {
    pub file: Option<File>,
    pub errors: Vec<ParseError>,
}

impl FileResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty() && self.file.is_some()
    }
}

/// Result of parsing a statement list.
#[derive(Debug)]
pub struct StmtResult {
    pub stmts: Vec<Stmt>,
    pub errors: Vec<ParseError>,
}

impl StmtResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A parse error with location and friendly message.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
}

impl ParseError {
    pub fn new(message: String, span: Span, hint: Option<String>) -> Self {
        Self {
            span,
            message,
            hint,
        }
    }

    fn expected(what: &str, got: &TokenKind, span: Span) -> Self {
        Self {
            span,
            message: format!("expected {}, found {}", what, got.display_name()),
            hint: None,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}
