use crate::ast::{self, Expression, Statement};
use crate::lexer::Lexer;
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenType};
use custom_error::custom_error;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::convert::TryFrom;
use std::rc::Rc;

custom_error! {
    #[derive(Clone, PartialEq)]
    pub ParseError

    UnexpectedToken{expected: TokenType, actual: TokenType} = "expected next token to be: {expected} but was: {actual}",
    NoPrefixParseFn{token_type: TokenType} = "no prefix parse function found for token type {token_type}",
    InvalidInteger{literal: String} = "could not parse {literal} as integer",
    UnterminatedBlock = "unterminated block: expected RBrace but reached end of input",
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
}

lazy_static! {
    static ref PRECEDENCES: HashMap<TokenType, Precedence> = vec![
        (TokenType::Eq, Precedence::Equals),
        (TokenType::NotEq, Precedence::Equals),
        (TokenType::LT, Precedence::LessGreater),
        (TokenType::GT, Precedence::LessGreater),
        (TokenType::Plus, Precedence::Sum),
        (TokenType::Minus, Precedence::Sum),
        (TokenType::Slash, Precedence::Product),
        (TokenType::Asterisk, Precedence::Product),
        (TokenType::LParen, Precedence::Call),
    ]
    .into_iter()
    .collect();
}

fn precedence_of(token: &Token) -> Precedence {
    PRECEDENCES
        .get(&token.token_type())
        .copied()
        .unwrap_or(Precedence::Lowest)
}

type PrefixParseFn = fn(&mut Parser) -> Option<Expression>;
type InfixParseFn = fn(&mut Parser, Expression) -> Option<Expression>;

fn prefix_parse_fn(token_type: TokenType) -> Option<PrefixParseFn> {
    match token_type {
        TokenType::Ident => Some(Parser::parse_identifier as PrefixParseFn),
        TokenType::Int => Some(Parser::parse_integer_literal),
        TokenType::True | TokenType::False => Some(Parser::parse_boolean),
        TokenType::Bang | TokenType::Minus => Some(Parser::parse_prefix_expression),
        TokenType::LParen => Some(Parser::parse_grouped_expression),
        TokenType::If => Some(Parser::parse_if_expression),
        TokenType::Function => Some(Parser::parse_function_literal),
        TokenType::Illegal
        | TokenType::Eof
        | TokenType::Assign
        | TokenType::Plus
        | TokenType::Slash
        | TokenType::Asterisk
        | TokenType::LT
        | TokenType::GT
        | TokenType::Eq
        | TokenType::NotEq
        | TokenType::Comma
        | TokenType::Semicolon
        | TokenType::RParen
        | TokenType::LBrace
        | TokenType::RBrace
        | TokenType::Else
        | TokenType::Let
        | TokenType::Return => None,
    }
}

fn infix_parse_fn(token_type: TokenType) -> Option<InfixParseFn> {
    match token_type {
        TokenType::Plus
        | TokenType::Minus
        | TokenType::Slash
        | TokenType::Asterisk
        | TokenType::LT
        | TokenType::GT
        | TokenType::Eq
        | TokenType::NotEq => Some(Parser::parse_infix_expression as InfixParseFn),
        TokenType::LParen => Some(Parser::parse_call_expression),
        TokenType::Illegal
        | TokenType::Eof
        | TokenType::Ident
        | TokenType::Int
        | TokenType::Assign
        | TokenType::Bang
        | TokenType::Comma
        | TokenType::Semicolon
        | TokenType::RParen
        | TokenType::LBrace
        | TokenType::RBrace
        | TokenType::Else
        | TokenType::False
        | TokenType::Function
        | TokenType::If
        | TokenType::Let
        | TokenType::Return
        | TokenType::True => None,
    }
}

pub struct Parser {
    lexer: Lexer,
    cur_token: Token,
    peek_token: Token,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        let cur_token = lexer.next_token();
        let peek_token = lexer.next_token();

        Self {
            lexer,
            cur_token,
            peek_token,
            errors: vec![],
        }
    }

    fn next_token(&mut self) {
        self.cur_token = std::mem::replace(&mut self.peek_token, self.lexer.next_token());
    }

    /// Parses the whole token stream. Any recorded error means the program must not
    /// be evaluated, so the errors are returned in place of the tree.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn parse_program(mut self) -> Result<ast::Program, Vec<ParseError>> {
        let mut program = ast::Program::default();

        while !self.cur_token.is(TokenType::Eof) {
            if let Some(stmt) = self.parse_statement() {
                program.statements.push(stmt)
            }
            self.next_token();
        }

        if self.errors.is_empty() {
            tracing::debug!(statements = program.statements.len(), "parsed program");
            Ok(program)
        } else {
            Err(self.errors)
        }
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.cur_token.token_type() {
            TokenType::Let => self.parse_let_statement().map(Statement::Let),
            TokenType::Return => self.parse_return_statement().map(Statement::Return),
            _ => self.parse_expression_statement().map(Statement::Expr),
        }
    }

    fn parse_let_statement(&mut self) -> Option<ast::LetStatement> {
        let name = self.expect_ident()?;

        if !self.expect_peek(TokenType::Assign) {
            return None;
        }
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenType::Semicolon) {
            return None;
        }

        Some(ast::LetStatement { name, value })
    }

    fn parse_return_statement(&mut self) -> Option<ast::ReturnStatement> {
        if self.peek_token.is(TokenType::Semicolon) {
            self.next_token();
            return Some(ast::ReturnStatement { return_value: None });
        }
        self.next_token();

        let return_value = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenType::Semicolon) {
            return None;
        }

        Some(ast::ReturnStatement {
            return_value: Some(return_value),
        })
    }

    fn parse_expression_statement(&mut self) -> Option<ast::ExpressionStatement> {
        let expression = self.parse_expression(Precedence::Lowest)?;

        if self.peek_token.is(TokenType::Semicolon) {
            self.next_token();
        }

        Some(ast::ExpressionStatement { expression })
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        ensure_sufficient_stack(|| {
            let prefix = match prefix_parse_fn(self.cur_token.token_type()) {
                Some(prefix) => prefix,
                None => {
                    let token_type = self.cur_token.token_type();
                    self.push_error(ParseError::NoPrefixParseFn { token_type });
                    return None;
                }
            };
            let mut left = prefix(self)?;

            while !self.peek_token.is(TokenType::Semicolon) && precedence < self.peek_precedence()
            {
                let infix = match infix_parse_fn(self.peek_token.token_type()) {
                    Some(infix) => infix,
                    None => return Some(left),
                };
                self.next_token();
                left = infix(self, left)?;
            }

            Some(left)
        })
    }

    fn parse_identifier(&mut self) -> Option<Expression> {
        match &self.cur_token {
            Token::Ident(name) => Some(Expression::Identifier(name.as_str().into())),
            _ => None,
        }
    }

    fn parse_integer_literal(&mut self) -> Option<Expression> {
        let literal = self.cur_token.literal();
        match literal.parse::<i64>() {
            Ok(value) => Some(Expression::IntegerLiteral(value)),
            Err(_) => {
                self.push_error(ParseError::InvalidInteger { literal });
                None
            }
        }
    }

    fn parse_boolean(&mut self) -> Option<Expression> {
        Some(Expression::Boolean(self.cur_token.is(TokenType::True)))
    }

    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        let operator = ast::Operator::try_from(&self.cur_token).ok()?;

        self.next_token();

        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expression::Prefix(ast::PrefixExpression {
            operator,
            right: Box::new(right),
        }))
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        let operator = ast::Operator::try_from(&self.cur_token).ok()?;
        let precedence = self.cur_precedence();

        self.next_token();

        let right = self.parse_expression(precedence)?;
        Some(Expression::Infix(ast::InfixExpression {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }))
    }

    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.next_token();

        let expression = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenType::RParen) {
            return None;
        }

        Some(expression)
    }

    fn parse_if_expression(&mut self) -> Option<Expression> {
        if !self.expect_peek(TokenType::LParen) {
            return None;
        }
        self.next_token();

        let condition = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenType::RParen) || !self.expect_peek(TokenType::LBrace) {
            return None;
        }

        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek_token.is(TokenType::Else) {
            self.next_token();
            if !self.expect_peek(TokenType::LBrace) {
                return None;
            }
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        Some(Expression::If(ast::IfExpression {
            condition: Box::new(condition),
            consequence,
            alternative,
        }))
    }

    fn parse_block_statement(&mut self) -> Option<ast::BlockStatement> {
        let mut block = ast::BlockStatement::default();

        self.next_token();

        while !self.cur_token.is(TokenType::RBrace) {
            if self.cur_token.is(TokenType::Eof) {
                self.push_error(ParseError::UnterminatedBlock);
                return None;
            }
            if let Some(stmt) = self.parse_statement() {
                block.statements.push(stmt);
            }
            self.next_token();
        }

        Some(block)
    }

    fn parse_function_literal(&mut self) -> Option<Expression> {
        if !self.expect_peek(TokenType::LParen) {
            return None;
        }

        let parameters = self.parse_function_parameters()?;

        if !self.expect_peek(TokenType::LBrace) {
            return None;
        }

        let body = self.parse_block_statement()?;

        Some(Expression::Function(Rc::new(ast::FunctionLiteral {
            parameters,
            body,
        })))
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<ast::Identifier>> {
        let mut identifiers = vec![];

        if self.peek_token.is(TokenType::RParen) {
            self.next_token();
            return Some(identifiers);
        }

        identifiers.push(self.expect_ident()?);

        while self.peek_token.is(TokenType::Comma) {
            self.next_token();
            identifiers.push(self.expect_ident()?);
        }

        if !self.expect_peek(TokenType::RParen) {
            return None;
        }

        Some(identifiers)
    }

    fn parse_call_expression(&mut self, function: Expression) -> Option<Expression> {
        let arguments = self.parse_expression_list(TokenType::RParen)?;

        Some(Expression::Call(ast::CallExpression {
            function: Box::new(function),
            arguments,
        }))
    }

    fn parse_expression_list(&mut self, end: TokenType) -> Option<Vec<Expression>> {
        let mut list = vec![];

        if self.peek_token.is(end) {
            self.next_token();
            return Some(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_token.is(TokenType::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_peek(end) {
            return None;
        }

        Some(list)
    }

    fn peek_precedence(&self) -> Precedence {
        precedence_of(&self.peek_token)
    }

    fn cur_precedence(&self) -> Precedence {
        precedence_of(&self.cur_token)
    }

    fn expect_peek(&mut self, expected: TokenType) -> bool {
        if self.peek_token.is(expected) {
            self.next_token();
            true
        } else {
            self.peek_error(expected);
            false
        }
    }

    fn expect_ident(&mut self) -> Option<ast::Identifier> {
        let ident = match &self.peek_token {
            Token::Ident(name) => ast::Identifier::from(name.as_str()),
            _ => {
                self.peek_error(TokenType::Ident);
                return None;
            }
        };
        self.next_token();
        Some(ident)
    }

    fn peek_error(&mut self, expected: TokenType) {
        let actual = self.peek_token.token_type();
        self.push_error(ParseError::UnexpectedToken { expected, actual });
    }

    fn push_error(&mut self, error: ParseError) {
        tracing::debug!(%error, "parse error");
        self.errors.push(error);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ast::{InfixExpression, Operator, PrefixExpression};
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> ast::Program {
        Parser::new(Lexer::new(input.to_owned()))
            .parse_program()
            .expect("Parse errors found")
    }

    fn parse_errors(input: &str) -> Vec<String> {
        match Parser::new(Lexer::new(input.to_owned())).parse_program() {
            Ok(program) => panic!("expected parse errors, got {}", program),
            Err(errors) => errors.iter().map(ParseError::to_string).collect(),
        }
    }

    fn single_expression(program: &ast::Program) -> &Expression {
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0] {
            Statement::Expr(stmt) => &stmt.expression,
            stmt => panic!("not an expression statement: {:?}", stmt),
        }
    }

    fn ident(name: &str) -> Box<Expression> {
        Box::new(Expression::Identifier(name.into()))
    }

    #[test]
    fn test_let_statements() {
        let cases = vec![
            ("let x = 5;", "x", Expression::IntegerLiteral(5)),
            ("let y = true;", "y", Expression::Boolean(true)),
            ("let foobar = y;", "foobar", Expression::Identifier("y".into())),
        ];

        for (input, name, value) in cases.into_iter() {
            let program = parse(input);
            assert_eq!(
                program.statements,
                vec![Statement::Let(ast::LetStatement {
                    name: name.into(),
                    value,
                })]
            );
        }
    }

    #[test]
    fn test_return_statements() {
        let program = parse(
            "
return 5;
return 10;
return 993322;
return;
",
        );

        let values: Vec<Option<Expression>> = program
            .statements
            .into_iter()
            .map(|stmt| match stmt {
                Statement::Return(ret_stmt) => ret_stmt.return_value,
                stmt => panic!("not a return statement: {:?}", stmt),
            })
            .collect();

        assert_eq!(
            values,
            vec![
                Some(Expression::IntegerLiteral(5)),
                Some(Expression::IntegerLiteral(10)),
                Some(Expression::IntegerLiteral(993322)),
                None,
            ]
        );
    }

    #[test]
    fn test_literal_expressions() {
        let cases = vec![
            ("foobar;", Expression::Identifier("foobar".into())),
            ("5;", Expression::IntegerLiteral(5)),
            ("true;", Expression::Boolean(true)),
            ("false", Expression::Boolean(false)),
        ];

        for (input, expected) in cases.into_iter() {
            let program = parse(input);
            assert_eq!(single_expression(&program), &expected);
        }
    }

    #[test]
    fn test_prefix_expressions() {
        let cases = vec![
            ("!5;", Operator::Bang, Expression::IntegerLiteral(5)),
            ("-15;", Operator::Minus, Expression::IntegerLiteral(15)),
            ("!true;", Operator::Bang, Expression::Boolean(true)),
            ("-a", Operator::Minus, Expression::Identifier("a".into())),
        ];

        for (input, operator, right) in cases.into_iter() {
            let program = parse(input);
            assert_eq!(
                single_expression(&program),
                &Expression::Prefix(PrefixExpression {
                    operator,
                    right: Box::new(right),
                })
            );
        }
    }

    #[test]
    fn test_infix_expressions() {
        let cases = vec![
            ("a + b;", Operator::Plus),
            ("a - b;", Operator::Minus),
            ("a * b;", Operator::Asterisk),
            ("a / b;", Operator::Slash),
            ("a > b;", Operator::GT),
            ("a < b;", Operator::LT),
            ("a == b;", Operator::Eq),
            ("a != b;", Operator::NotEq),
        ];

        for (input, operator) in cases.into_iter() {
            let program = parse(input);
            assert_eq!(
                single_expression(&program),
                &Expression::Infix(InfixExpression {
                    left: ident("a"),
                    operator,
                    right: ident("b"),
                })
            );
        }
    }

    #[test]
    fn test_operator_precedence() {
        let cases = vec![
            ("-a * b", "((-a) * b);"),
            ("!-a", "(!(-a));"),
            ("a + b + c", "((a + b) + c);"),
            ("a + b - c", "((a + b) - c);"),
            ("a * b * c", "((a * b) * c);"),
            ("a * b / c", "((a * b) / c);"),
            ("a + b / c", "(a + (b / c));"),
            ("a + b * c + d / e - f", "(((a + (b * c)) + (d / e)) - f);"),
            ("3 + 4; -5 * 5", "(3 + 4);((-5) * 5);"),
            ("5 > 4 == 3 < 4", "((5 > 4) == (3 < 4));"),
            ("5 < 4 != 3 > 4", "((5 < 4) != (3 > 4));"),
            (
                "3 + 4 * 5 == 3 * 1 + 4 * 5",
                "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)));",
            ),
            ("true", "true;"),
            ("3 > 5 == false", "((3 > 5) == false);"),
            ("1 + (2 + 3) + 4", "((1 + (2 + 3)) + 4);"),
            ("(5 + 5) * 2", "((5 + 5) * 2);"),
            ("2 / (5 + 5)", "(2 / (5 + 5));"),
            ("-(5 + 5)", "(-(5 + 5));"),
            ("!(true == true)", "(!(true == true));"),
            ("a + add(b * c) + d", "((a + add((b * c))) + d);"),
            (
                "add(a, b, 1, 2 * 3, 4 + 5, add(6, 7 * 8))",
                "add(a, b, 1, (2 * 3), (4 + 5), add(6, (7 * 8)));",
            ),
            (
                "add(a + b + c * d / f + g)",
                "add((((a + b) + ((c * d) / f)) + g));",
            ),
            ("f(x) + 1", "(f(x) + 1);"),
        ];

        for (input, expected) in cases.into_iter() {
            assert_eq!(parse(input).to_string(), expected, "input: {}", input);
        }
    }

    #[test]
    fn test_if_expression() {
        let program = parse("if (x < y) { x }");

        match single_expression(&program) {
            Expression::If(expr) => {
                assert_eq!(expr.condition.to_string(), "(x < y)");
                assert_eq!(expr.consequence.to_string(), "{ x; }");
                assert_eq!(expr.alternative, None);
            }
            expr => panic!("not an if expression: {:?}", expr),
        }
    }

    #[test]
    fn test_if_else_expression() {
        let program = parse("if (x < y) { x } else { let z = y; z }");

        match single_expression(&program) {
            Expression::If(expr) => {
                assert_eq!(expr.consequence.to_string(), "{ x; }");
                let alternative = expr.alternative.as_ref().expect("missing alternative");
                assert_eq!(alternative.to_string(), "{ let z = y; z; }");
            }
            expr => panic!("not an if expression: {:?}", expr),
        }
    }

    #[test]
    fn test_function_literal() {
        let program = parse("fn(x, y) { x + y; }");

        match single_expression(&program) {
            Expression::Function(func) => {
                assert_eq!(
                    func.parameters,
                    vec![ast::Identifier::from("x"), ast::Identifier::from("y")]
                );
                assert_eq!(func.body.to_string(), "{ (x + y); }");
            }
            expr => panic!("not a function literal: {:?}", expr),
        }
    }

    #[test]
    fn test_function_parameters() {
        let cases = vec![
            ("fn() {};", vec![]),
            ("fn(x) {};", vec!["x"]),
            ("fn(x, y, z) {};", vec!["x", "y", "z"]),
        ];

        for (input, expected) in cases.into_iter() {
            let program = parse(input);
            match single_expression(&program) {
                Expression::Function(func) => {
                    let names: Vec<&str> =
                        func.parameters.iter().map(|p| p.value.as_str()).collect();
                    assert_eq!(names, expected);
                }
                expr => panic!("not a function literal: {:?}", expr),
            }
        }
    }

    #[test]
    fn test_call_expression() {
        let program = parse("add(1, 2 * 3, 4 + 5);");

        match single_expression(&program) {
            Expression::Call(call) => {
                assert_eq!(call.function, ident("add"));
                let args: Vec<String> = call.arguments.iter().map(Expression::to_string).collect();
                assert_eq!(args, vec!["1", "(2 * 3)", "(4 + 5)"]);
            }
            expr => panic!("not a call expression: {:?}", expr),
        }
    }

    #[test]
    fn test_call_without_arguments() {
        let program = parse("fn() { 1 }()");
        assert_eq!(program.to_string(), "fn() { 1; }();");
    }

    #[test]
    fn test_missing_assign() {
        assert_eq!(
            parse_errors("let x 5;"),
            vec!["expected next token to be: Assign but was: Int"]
        );
    }

    #[test]
    fn test_parse_errors() {
        let cases = vec![
            (
                "let = 10;",
                vec![
                    "expected next token to be: Ident but was: Assign",
                    "no prefix parse function found for token type Assign",
                ],
            ),
            (
                "let x = 5",
                vec!["expected next token to be: Semicolon but was: Eof"],
            ),
            (
                "return 5",
                vec!["expected next token to be: Semicolon but was: Eof"],
            ),
            (
                "(1 + 2",
                vec!["expected next token to be: RParen but was: Eof"],
            ),
            (
                "if x { 1 }",
                vec![
                    "expected next token to be: LParen but was: Ident",
                    "no prefix parse function found for token type LBrace",
                    "no prefix parse function found for token type RBrace",
                ],
            ),
            (
                "fn(1) { 1 }",
                vec![
                    "expected next token to be: Ident but was: Int",
                    "no prefix parse function found for token type RParen",
                    "no prefix parse function found for token type LBrace",
                    "no prefix parse function found for token type RBrace",
                ],
            ),
            (
                "99999999999999999999;",
                vec![
                    "could not parse 99999999999999999999 as integer",
                    "no prefix parse function found for token type Semicolon",
                ],
            ),
            ("@", vec!["no prefix parse function found for token type Illegal"]),
        ];

        for (input, expected) in cases.into_iter() {
            assert_eq!(parse_errors(input), expected, "input: {}", input);
        }
    }

    #[test]
    fn test_errors_do_not_stop_later_statements() {
        let errors = parse_errors("let x 5; let y = 10; let = 3; z;");
        assert_eq!(
            errors,
            vec![
                "expected next token to be: Assign but was: Int",
                "expected next token to be: Ident but was: Assign",
                "no prefix parse function found for token type Assign",
            ]
        );
    }

    #[test]
    fn test_unterminated_block() {
        assert_eq!(
            parse_errors("if (true) { 1"),
            vec!["unterminated block: expected RBrace but reached end of input"]
        );
        assert_eq!(
            parse_errors("let f = fn(x) { x + 1;"),
            vec!["unterminated block: expected RBrace but reached end of input"]
        );
    }

    #[test]
    fn test_deeply_nested_groups() {
        let depth = 5_000;
        let input = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        let program = parse(&input);
        assert_eq!(single_expression(&program), &Expression::IntegerLiteral(1));
    }

    #[test]
    fn test_deeply_nested_trees() {
        let depth = 100_000;

        let negations = parse(&format!("{}1", "-".repeat(depth)));
        assert_eq!(
            negations.to_string(),
            format!("{}1{};", "(-".repeat(depth), ")".repeat(depth))
        );

        let sum = parse(&format!("1{}", " + 1".repeat(depth)));
        assert_eq!(
            sum.to_string(),
            format!("{}1{};", "(".repeat(depth), " + 1)".repeat(depth))
        );

        let functions = parse(&format!("{}1{}", "fn() { ".repeat(20_000), " }".repeat(20_000)));
        assert!(functions.to_string().starts_with("fn() { fn() { "));
        assert!(functions.to_string().ends_with("1; }; }; };"));
    }
}
