//! Recursive descent parser for scripts

use crate::common::{CompileError, CompileResult, Span};
use crate::frontend::ast::*;
use crate::frontend::lexer::{Lexer, Token, TokenKind};

/// Names that always denote a type inside a parenthesized cast
const CAST_KEYWORDS: &[&str] = &[
    "boolean", "byte", "short", "char", "int", "long", "float", "double", "def",
];

/// Recursive descent parser for scripts.
///
/// The whole source is tokenized up front; declarations and casts need
/// more than one token of lookahead to tell apart from expressions.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    eof: Token,
    ids: NodeIdGen,
    names: Interner,
}

impl Parser {
    /// Create a new parser for the given source
    pub fn new(source: &str) -> CompileResult<Self> {
        let tokens = Lexer::new(source).tokenize_all()?;
        let end = source.len();
        Ok(Self {
            tokens,
            pos: 0,
            eof: Token::new(TokenKind::Eof, Span::new(end, end)),
            ids: NodeIdGen::new(),
            names: Interner::new(),
        })
    }

    /// Parse the whole source as the body of a script
    pub fn parse(mut self) -> CompileResult<Script> {
        let mut statements = Vec::new();

        while !self.at_end() {
            statements.push(self.parse_statement()?);
        }

        let span = Span::new(0, self.eof.span.end);
        let body = Block::new(self.ids.next_id(), statements, span);
        let node_count = self.ids.count();
        Ok(Script::new(body, self.names, node_count))
    }

    // =========================================================================
    // Helper methods
    // =========================================================================

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn peek_kind(&self, offset: usize) -> &TokenKind {
        &self.tokens.get(self.pos + offset).unwrap_or(&self.eof).kind
    }

    fn previous_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(token) => token.span,
            None => self.current().span,
        }
    }

    fn at_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !self.at_end() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> CompileResult<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(CompileError::parser(
                format!("expected {}, found {}", kind, self.current().kind),
                self.current().span,
            ))
        }
    }

    fn expect_identifier(&mut self, what: &str) -> CompileResult<(String, Span)> {
        if let TokenKind::Identifier(name) = &self.current().kind {
            let name = name.clone();
            let span = self.advance().span;
            Ok((name, span))
        } else {
            Err(CompileError::parser(
                format!("expected {}, found {}", what, self.current().kind),
                self.current().span,
            ))
        }
    }

    /// `;` ends a statement; it may be left out before `}` and at the end
    /// of the script
    fn expect_terminator(&mut self) -> CompileResult<()> {
        if self.match_token(&TokenKind::Semi) || self.check(&TokenKind::RBrace) || self.at_end() {
            Ok(())
        } else {
            Err(CompileError::parser(
                format!("expected ';', found {}", self.current().kind),
                self.current().span,
            ))
        }
    }

    fn expr(&mut self, kind: ExprKind, span: Span) -> Expr {
        Expr::new(self.ids.next_id(), kind, span)
    }

    fn stmt(&mut self, kind: StmtKind, span: Span) -> Stmt {
        Stmt::new(self.ids.next_id(), kind, span)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_statement(&mut self) -> CompileResult<Stmt> {
        match &self.current().kind {
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Do => self.parse_do_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Break => self.parse_jump_statement(StmtKind::Break),
            TokenKind::Continue => self.parse_jump_statement(StmtKind::Continue),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Throw => self.parse_throw_statement(),
            _ if self.at_declaration() => {
                let stmt = self.parse_declaration()?;
                self.expect_terminator()?;
                Ok(stmt)
            }
            _ => self.parse_expression_statement(),
        }
    }

    /// A braced block, or a single statement standing in for a block of one
    fn parse_body(&mut self) -> CompileResult<Block> {
        if self.check(&TokenKind::LBrace) {
            return self.parse_block();
        }

        let start_span = self.current().span;
        if self.match_token(&TokenKind::Semi) {
            return Ok(Block::new(self.ids.next_id(), Vec::new(), start_span));
        }

        let stmt = self.parse_statement()?;
        let span = stmt.span;
        Ok(Block::new(self.ids.next_id(), vec![stmt], span))
    }

    fn parse_block(&mut self) -> CompileResult<Block> {
        let start_span = self.current().span;
        self.expect(TokenKind::LBrace)?;

        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            statements.push(self.parse_statement()?);
        }

        self.expect(TokenKind::RBrace)?;
        let span = start_span.merge(self.previous_span());

        Ok(Block::new(self.ids.next_id(), statements, span))
    }

    /// `Type name`, where the type may be qualified: `java.util.List list`
    fn at_declaration(&self) -> bool {
        if !matches!(self.peek_kind(0), TokenKind::Identifier(_)) {
            return false;
        }
        let mut offset = 1;
        while matches!(self.peek_kind(offset), TokenKind::Dot)
            && matches!(self.peek_kind(offset + 1), TokenKind::Identifier(_))
        {
            offset += 2;
        }
        matches!(self.peek_kind(offset), TokenKind::Identifier(_))
    }

    fn parse_declaration(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current().span;
        let ty = self.parse_type_name()?;
        let (name, _) = self.expect_identifier("variable name")?;
        let name = self.names.intern(&name);

        let init = if self.match_token(&TokenKind::Eq) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        let span = start_span.merge(self.previous_span());
        Ok(self.stmt(StmtKind::Declaration { ty, name, init }, span))
    }

    fn parse_type_name(&mut self) -> CompileResult<TypeName> {
        let (mut name, start_span) = self.expect_identifier("type name")?;

        while self.check(&TokenKind::Dot)
            && matches!(self.peek_kind(1), TokenKind::Identifier(_))
        {
            self.advance();
            let (segment, _) = self.expect_identifier("type name")?;
            name.push('.');
            name.push_str(&segment);
        }

        Ok(TypeName::new(name, start_span.merge(self.previous_span())))
    }

    fn parse_if_statement(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current().span;
        self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;

        let then_block = self.parse_body()?;

        let else_block = if self.match_token(&TokenKind::Else) {
            Some(self.parse_body()?)
        } else {
            None
        };

        let span = start_span.merge(self.previous_span());
        Ok(self.stmt(
            StmtKind::If {
                condition,
                then_block,
                else_block,
            },
            span,
        ))
    }

    fn parse_while_statement(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current().span;
        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;

        let body = if self.match_token(&TokenKind::Semi) {
            None
        } else {
            Some(self.parse_body()?)
        };
        let span = start_span.merge(self.previous_span());

        Ok(self.stmt(StmtKind::While { condition, body }, span))
    }

    fn parse_do_while_statement(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current().span;
        self.expect(TokenKind::Do)?;

        let body = self.parse_body()?;

        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        let span = start_span.merge(self.previous_span());
        self.expect_terminator()?;

        Ok(self.stmt(StmtKind::DoWhile { body, condition }, span))
    }

    fn parse_for_statement(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current().span;
        self.expect(TokenKind::For)?;
        self.expect(TokenKind::LParen)?;

        // Init
        let init = if self.check(&TokenKind::Semi) {
            None
        } else if self.at_declaration() {
            Some(Box::new(self.parse_declaration()?))
        } else {
            let expr = self.parse_expression()?;
            let span = expr.span;
            Some(Box::new(self.stmt(StmtKind::Expression(expr), span)))
        };
        self.expect(TokenKind::Semi)?;

        // Condition
        let condition = if self.check(&TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semi)?;

        // Update
        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::RParen)?;

        let body = if self.match_token(&TokenKind::Semi) {
            None
        } else {
            Some(self.parse_body()?)
        };
        let span = start_span.merge(self.previous_span());

        Ok(self.stmt(
            StmtKind::For {
                init,
                condition,
                update,
                body,
            },
            span,
        ))
    }

    fn parse_jump_statement(&mut self, kind: StmtKind) -> CompileResult<Stmt> {
        let span = self.advance().span;
        self.expect_terminator()?;
        Ok(self.stmt(kind, span))
    }

    fn parse_return_statement(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current().span;
        self.expect(TokenKind::Return)?;

        let value = if self.check(&TokenKind::Semi) || self.check(&TokenKind::RBrace) || self.at_end() {
            None
        } else {
            Some(self.parse_expression()?)
        };

        let span = start_span.merge(self.previous_span());
        self.expect_terminator()?;

        Ok(self.stmt(StmtKind::Return(value), span))
    }

    fn parse_throw_statement(&mut self) -> CompileResult<Stmt> {
        let start_span = self.current().span;
        self.expect(TokenKind::Throw)?;
        let value = self.parse_expression()?;
        let span = start_span.merge(value.span);
        self.expect_terminator()?;

        Ok(self.stmt(StmtKind::Throw(value), span))
    }

    fn parse_expression_statement(&mut self) -> CompileResult<Stmt> {
        let expr = self.parse_expression()?;
        let span = expr.span;
        self.expect_terminator()?;

        Ok(self.stmt(StmtKind::Expression(expr), span))
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn parse_expression(&mut self) -> CompileResult<Expr> {
        self.parse_assignment_expression()
    }

    fn parse_assignment_expression(&mut self) -> CompileResult<Expr> {
        let target = self.parse_conditional_expression()?;

        if !self.current().kind.is_assignment_op() {
            return Ok(target);
        }
        let op = self.compound_op();
        self.advance();

        if !is_assignable(&target) {
            return Err(CompileError::parser("invalid assignment target", target.span));
        }

        let value = self.parse_assignment_expression()?;
        let span = target.span.merge(value.span);
        Ok(self.expr(
            ExprKind::Assign {
                target: Box::new(target),
                op,
                value: Box::new(value),
                postfix: false,
            },
            span,
        ))
    }

    /// Operator behind a compound assignment token, `None` for plain `=`
    fn compound_op(&self) -> Option<BinaryOp> {
        match self.current().kind {
            TokenKind::PlusEq => Some(BinaryOp::Add),
            TokenKind::MinusEq => Some(BinaryOp::Sub),
            TokenKind::StarEq => Some(BinaryOp::Mul),
            TokenKind::SlashEq => Some(BinaryOp::Div),
            TokenKind::PercentEq => Some(BinaryOp::Rem),
            TokenKind::AmpEq => Some(BinaryOp::BitAnd),
            TokenKind::PipeEq => Some(BinaryOp::BitOr),
            TokenKind::CaretEq => Some(BinaryOp::BitXor),
            TokenKind::LtLtEq => Some(BinaryOp::Shl),
            TokenKind::GtGtEq => Some(BinaryOp::Shr),
            _ => None,
        }
    }

    fn parse_conditional_expression(&mut self) -> CompileResult<Expr> {
        let condition = self.parse_logical_or_expression()?;

        if !self.match_token(&TokenKind::Question) {
            return Ok(condition);
        }

        let then_expr = self.parse_expression()?;
        self.expect(TokenKind::Colon)?;
        let else_expr = self.parse_conditional_expression()?;
        let span = condition.span.merge(else_expr.span);

        Ok(self.expr(
            ExprKind::Conditional {
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            span,
        ))
    }

    fn parse_logical_or_expression(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_logical_and_expression()?;

        while self.match_token(&TokenKind::PipePipe) {
            let right = self.parse_logical_and_expression()?;
            left = self.logical(LogicalOp::Or, left, right);
        }

        Ok(left)
    }

    fn parse_logical_and_expression(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_bitwise_or_expression()?;

        while self.match_token(&TokenKind::AmpAmp) {
            let right = self.parse_bitwise_or_expression()?;
            left = self.logical(LogicalOp::And, left, right);
        }

        Ok(left)
    }

    fn parse_bitwise_or_expression(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_bitwise_xor_expression()?;

        while self.match_token(&TokenKind::Pipe) {
            let right = self.parse_bitwise_xor_expression()?;
            left = self.binary(BinaryOp::BitOr, left, right);
        }

        Ok(left)
    }

    fn parse_bitwise_xor_expression(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_bitwise_and_expression()?;

        while self.match_token(&TokenKind::Caret) {
            let right = self.parse_bitwise_and_expression()?;
            left = self.binary(BinaryOp::BitXor, left, right);
        }

        Ok(left)
    }

    fn parse_bitwise_and_expression(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_equality_expression()?;

        while self.match_token(&TokenKind::Amp) {
            let right = self.parse_equality_expression()?;
            left = self.binary(BinaryOp::BitAnd, left, right);
        }

        Ok(left)
    }

    fn parse_equality_expression(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_relational_expression()?;

        loop {
            let op = match &self.current().kind {
                TokenKind::EqEq => CompareOp::Eq,
                TokenKind::NotEq => CompareOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational_expression()?;
            left = self.comparison(op, left, right);
        }

        Ok(left)
    }

    fn parse_relational_expression(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_shift_expression()?;

        loop {
            let op = match &self.current().kind {
                TokenKind::Lt => CompareOp::Lt,
                TokenKind::Gt => CompareOp::Gt,
                TokenKind::LtEq => CompareOp::Le,
                TokenKind::GtEq => CompareOp::Ge,
                TokenKind::Instanceof => {
                    self.advance();
                    let ty = self.parse_type_name()?;
                    let span = left.span.merge(ty.span);
                    left = self.expr(
                        ExprKind::Instanceof {
                            expr: Box::new(left),
                            ty,
                        },
                        span,
                    );
                    continue;
                }
                _ => break,
            };
            self.advance();
            let right = self.parse_shift_expression()?;
            left = self.comparison(op, left, right);
        }

        Ok(left)
    }

    fn parse_shift_expression(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_additive_expression()?;

        loop {
            let op = match &self.current().kind {
                TokenKind::LtLt => BinaryOp::Shl,
                TokenKind::GtGt => BinaryOp::Shr,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive_expression()?;
            left = self.binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_additive_expression(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_multiplicative_expression()?;

        loop {
            let op = match &self.current().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative_expression()?;
            left = self.binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_multiplicative_expression(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_unary_expression()?;

        loop {
            let op = match &self.current().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary_expression()?;
            left = self.binary(op, left, right);
        }

        Ok(left)
    }

    fn binary(&mut self, op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        let span = lhs.span.merge(rhs.span);
        self.expr(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        )
    }

    fn comparison(&mut self, op: CompareOp, lhs: Expr, rhs: Expr) -> Expr {
        let span = lhs.span.merge(rhs.span);
        self.expr(
            ExprKind::Comparison {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        )
    }

    fn logical(&mut self, op: LogicalOp, lhs: Expr, rhs: Expr) -> Expr {
        let span = lhs.span.merge(rhs.span);
        self.expr(
            ExprKind::Logical {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        )
    }

    fn parse_unary_expression(&mut self) -> CompileResult<Expr> {
        let start_span = self.current().span;

        let op = match &self.current().kind {
            TokenKind::PlusPlus | TokenKind::MinusMinus => return self.parse_prefix_update(),
            // folded so that the most negative int and long constants parse
            TokenKind::Minus if self.peek_kind(1).is_numeric_literal() => {
                self.advance();
                return self.parse_number(true, start_span);
            }
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Tilde => UnaryOp::BitNot,
            TokenKind::LParen if self.at_cast() => return self.parse_cast(),
            _ => return self.parse_postfix_expression(),
        };

        self.advance();
        let operand = self.parse_unary_expression()?;
        let span = start_span.merge(operand.span);
        Ok(self.expr(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn parse_prefix_update(&mut self) -> CompileResult<Expr> {
        let token = self.advance();
        let op = update_op(&token.kind);
        let target = self.parse_unary_expression()?;
        let span = token.span.merge(target.span);
        self.update(target, op, token.span, false, span)
    }

    /// `++x` and `x--` become a compound assignment of the constant one
    fn update(
        &mut self,
        target: Expr,
        op: BinaryOp,
        op_span: Span,
        postfix: bool,
        span: Span,
    ) -> CompileResult<Expr> {
        if !is_assignable(&target) {
            return Err(CompileError::parser(
                "invalid increment or decrement target",
                target.span,
            ));
        }

        let one = self.expr(ExprKind::Int(1), op_span);
        Ok(self.expr(
            ExprKind::Assign {
                target: Box::new(target),
                op: Some(op),
                value: Box::new(one),
                postfix,
            },
            span,
        ))
    }

    /// `(Type) operand`. Primitive and `def` names always start a cast; any
    /// other parenthesized name only when an operand follows directly.
    fn at_cast(&self) -> bool {
        let TokenKind::Identifier(first) = self.peek_kind(1) else {
            return false;
        };
        let mut offset = 2;
        let mut qualified = false;
        while matches!(self.peek_kind(offset), TokenKind::Dot)
            && matches!(self.peek_kind(offset + 1), TokenKind::Identifier(_))
        {
            offset += 2;
            qualified = true;
        }
        if !matches!(self.peek_kind(offset), TokenKind::RParen) {
            return false;
        }
        (!qualified && CAST_KEYWORDS.contains(&first.as_str()))
            || self.peek_kind(offset + 1).can_follow_cast()
    }

    fn parse_cast(&mut self) -> CompileResult<Expr> {
        let start_span = self.current().span;
        self.expect(TokenKind::LParen)?;
        let ty = self.parse_type_name()?;
        self.expect(TokenKind::RParen)?;

        let operand = self.parse_unary_expression()?;
        let span = start_span.merge(operand.span);
        Ok(self.expr(
            ExprKind::Cast {
                ty,
                expr: Box::new(operand),
            },
            span,
        ))
    }

    fn parse_postfix_expression(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_primary_expression()?;

        loop {
            let start_span = expr.span;
            match &self.current().kind {
                TokenKind::Dot => {
                    self.advance();
                    let (name, _) = self.expect_identifier("member name")?;
                    let name = self.names.intern(&name);

                    if self.match_token(&TokenKind::LParen) {
                        let args = self.parse_argument_list()?;
                        self.expect(TokenKind::RParen)?;
                        let span = start_span.merge(self.previous_span());
                        expr = self.expr(
                            ExprKind::Call {
                                prefix: Box::new(expr),
                                name,
                                args,
                            },
                            span,
                        );
                    } else {
                        let span = start_span.merge(self.previous_span());
                        expr = self.expr(
                            ExprKind::Dot {
                                prefix: Box::new(expr),
                                name,
                            },
                            span,
                        );
                    }
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let token = self.advance();
                    let op = update_op(&token.kind);
                    let span = start_span.merge(token.span);
                    expr = self.update(expr, op, token.span, true, span)?;
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_argument_list(&mut self) -> CompileResult<Vec<Expr>> {
        let mut args = Vec::new();

        if self.check(&TokenKind::RParen) {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        Ok(args)
    }

    fn parse_primary_expression(&mut self) -> CompileResult<Expr> {
        let span = self.current().span;

        let kind = match &self.current().kind {
            kind if kind.is_numeric_literal() => return self.parse_number(false, span),
            TokenKind::StringLiteral(raw) => {
                let value = unescape(raw, span)?;
                self.advance();
                ExprKind::Str(value)
            }
            TokenKind::True => {
                self.advance();
                ExprKind::Bool(true)
            }
            TokenKind::False => {
                self.advance();
                ExprKind::Bool(false)
            }
            TokenKind::Null => {
                self.advance();
                ExprKind::Null
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                ExprKind::Symbol(self.names.intern(&name))
            }
            TokenKind::New => return self.parse_new_expression(),
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                return Ok(expr);
            }
            other => {
                return Err(CompileError::parser(
                    format!("unexpected token in expression: {}", other),
                    span,
                ));
            }
        };

        Ok(self.expr(kind, span))
    }

    fn parse_new_expression(&mut self) -> CompileResult<Expr> {
        let start_span = self.current().span;
        self.expect(TokenKind::New)?;
        let ty = self.parse_type_name()?;
        self.expect(TokenKind::LParen)?;
        let args = self.parse_argument_list()?;
        self.expect(TokenKind::RParen)?;

        let span = start_span.merge(self.previous_span());
        Ok(self.expr(ExprKind::New { ty, args }, span))
    }

    fn parse_number(&mut self, negative: bool, start_span: Span) -> CompileResult<Expr> {
        let token = self.advance();
        let span = start_span.merge(token.span);

        let kind = match &token.kind {
            TokenKind::IntLiteral(digits) => integer_literal(digits, 10, false, negative, span)?,
            TokenKind::LongLiteral(text) => {
                let digits = text.trim_end_matches(['l', 'L']);
                integer_literal(digits, 10, true, negative, span)?
            }
            TokenKind::HexLiteral(text) => {
                let long = text.ends_with(['l', 'L']);
                let digits = text[2..].trim_end_matches(['l', 'L']);
                integer_literal(digits, 16, long, negative, span)?
            }
            TokenKind::DecimalLiteral(text) => decimal_literal(text, negative, span)?,
            other => {
                return Err(CompileError::parser(
                    format!("expected a number, found {}", other),
                    token.span,
                ));
            }
        };

        Ok(self.expr(kind, span))
    }
}

fn is_assignable(expr: &Expr) -> bool {
    matches!(expr.kind, ExprKind::Symbol(_) | ExprKind::Dot { .. })
}

fn update_op(kind: &TokenKind) -> BinaryOp {
    if matches!(kind, TokenKind::MinusMinus) {
        BinaryOp::Sub
    } else {
        BinaryOp::Add
    }
}

// =========================================================================
// Literal parsing helpers
// =========================================================================

/// Decimal constants must fit their type; hex constants may use the sign
/// bit, so `0xFFFFFFFF` is `-1`.
fn integer_literal(
    digits: &str,
    radix: u32,
    long: bool,
    negative: bool,
    span: Span,
) -> CompileResult<ExprKind> {
    let invalid = || {
        CompileError::parser(
            format!(
                "invalid {} constant [{}{}]",
                if long { "long" } else { "int" },
                if negative { "-" } else { "" },
                digits
            ),
            span,
        )
    };

    let magnitude = u64::from_str_radix(digits, radix).map_err(|_| invalid())?;

    if radix == 10 {
        let value = if negative {
            -i128::from(magnitude)
        } else {
            i128::from(magnitude)
        };
        if long {
            i64::try_from(value).map(ExprKind::Long).map_err(|_| invalid())
        } else {
            i32::try_from(value).map(ExprKind::Int).map_err(|_| invalid())
        }
    } else if long {
        let bits = magnitude as i64;
        Ok(ExprKind::Long(if negative { bits.wrapping_neg() } else { bits }))
    } else {
        let bits = u32::try_from(magnitude).map_err(|_| invalid())? as i32;
        Ok(ExprKind::Int(if negative { bits.wrapping_neg() } else { bits }))
    }
}

fn decimal_literal(text: &str, negative: bool, span: Span) -> CompileResult<ExprKind> {
    let invalid = || CompileError::parser(format!("invalid decimal constant [{}]", text), span);

    if let Some(digits) = text.strip_suffix(['f', 'F']) {
        let value: f32 = digits.parse().map_err(|_| invalid())?;
        if !value.is_finite() {
            return Err(invalid());
        }
        Ok(ExprKind::Float(if negative { -value } else { value }))
    } else {
        let value: f64 = text.trim_end_matches(['d', 'D']).parse().map_err(|_| invalid())?;
        if !value.is_finite() {
            return Err(invalid());
        }
        Ok(ExprKind::Double(if negative { -value } else { value }))
    }
}

/// Strip the quotes of a string literal and resolve its escapes
fn unescape(raw: &str, span: Span) -> CompileResult<String> {
    let inner = &raw[1..raw.len() - 1];
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('b') => '\u{8}',
            Some('f') => '\u{c}',
            Some('0') => '\0',
            Some(c @ ('\\' | '"' | '\'')) => c,
            Some(other) => {
                return Err(CompileError::parser(
                    format!("invalid escape sequence '\\{}'", other),
                    span,
                ));
            }
            None => return Err(CompileError::parser("unterminated escape sequence", span)),
        };
        result.push(escaped);
    }

    Ok(result)
}
