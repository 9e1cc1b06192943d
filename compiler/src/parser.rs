use log::trace;

use crate::{
    error::WireError,
    tokenizer::{Token, TokenKind},
    types::{
        enum_width, Builtin, ConstValue, Definition, DefinitionKind, EnumItem, StructMember,
        TypeId, TypeTable, UnionArm,
    },
    utils::{parse_error, quote},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Name,
    Equals,
    Const,
    Array,
    Struct,
    Enum,
    Union,
}

/// Where the declaration being parsed started.
struct Pending {
    name:   String,
    file:   String,
    line:   usize,
    column: usize,
    level:  usize,
}

/// Parse a token stream into a fresh table seeded with the builtins.
pub fn parse_schema(tokens: &[Token]) -> Result<TypeTable, WireError> {
    let mut table = TypeTable::with_builtins();
    parse_into(tokens, &mut table)?;
    Ok(table)
}

/// Parse a token stream, appending to `table`. Stops at the first error.
pub fn parse_into(tokens: &[Token], table: &mut TypeTable) -> Result<(), WireError> {
    let last = match tokens.last() {
        Some(last) => last,
        None => return Ok(()),
    };
    // A slice cut short of its Eof still has to stop somewhere.
    let terminated;
    let tokens = if last.kind == TokenKind::Eof {
        tokens
    } else {
        let mut owned = tokens.to_vec();
        owned.push(Token { kind: TokenKind::Eof, ..last.clone() });
        terminated = owned;
        &terminated[..]
    };
    let mut parser = Parser {
        tokens,
        index: 0,
        depth: 0,
        table,
    };
    parser.run()
}

struct Parser<'t, 'a> {
    tokens: &'t [Token],
    index:  usize,
    depth:  usize,
    table:  &'a mut TypeTable,
}

impl<'t, 'a> Parser<'t, 'a> {
    fn run(&mut self) -> Result<(), WireError> {
        let mut state = State::Initial;
        let mut pending: Option<Pending> = None;

        loop {
            let token = self.current();
            if state == State::Initial && token.kind == TokenKind::Eof {
                return Ok(());
            }

            state = match state {
                State::Initial => match &token.kind {
                    TokenKind::IncludeEnter(path) => {
                        self.depth += 1;
                        if self.depth == 1 && !self.table.has_include(path) {
                            self.table.insert(Definition {
                                name:   path.clone(),
                                file:   token.file.clone(),
                                line:   token.line,
                                column: token.column,
                                level:  self.depth,
                                kind:   DefinitionKind::Include { path: path.clone() },
                            });
                        }
                        self.index += 1;
                        State::Initial
                    }
                    TokenKind::IncludeExit => {
                        self.depth = self.depth.saturating_sub(1);
                        self.index += 1;
                        State::Initial
                    }
                    TokenKind::Word(name) => {
                        if self.table.find(name).is_some() {
                            return Err(parse_error(&format!("redefinition of {}", quote(name)), token));
                        }
                        pending = Some(Pending {
                            name:   name.clone(),
                            file:   token.file.clone(),
                            line:   token.line,
                            column: token.column,
                            level:  self.depth,
                        });
                        self.index += 1;
                        State::Name
                    }
                    _ => return Err(self.unexpected_token("identifier")),
                },

                State::Name => {
                    self.expect(&TokenKind::Equals)?;
                    State::Equals
                }

                State::Equals => {
                    let word = self.expect_word("identifier")?;
                    match word.as_str() {
                        "const" => State::Const,
                        "array" => State::Array,
                        "struct" => State::Struct,
                        "enum" => State::Enum,
                        "union" => State::Union,
                        _ => {
                            let target = self.table.find(&word).ok_or_else(|| {
                                parse_error(&format!("unknown base type {}", quote(&word)), token)
                            })?;
                            if !self.table.is_type(target) {
                                return Err(parse_error(&format!("{} is not a type", quote(&word)), token));
                            }
                            self.define(pending.take(), DefinitionKind::Alias { target });
                            State::Initial
                        }
                    }
                }

                State::Const => {
                    let kind = self.parse_const()?;
                    self.define(pending.take(), kind);
                    State::Initial
                }
                State::Array => {
                    let kind = self.parse_array()?;
                    self.define(pending.take(), kind);
                    State::Initial
                }
                State::Struct => {
                    let kind = self.parse_struct()?;
                    self.define(pending.take(), kind);
                    State::Initial
                }
                State::Enum => {
                    let kind = self.parse_enum()?;
                    self.define(pending.take(), kind);
                    State::Initial
                }
                State::Union => {
                    let kind = self.parse_union()?;
                    self.define(pending.take(), kind);
                    State::Initial
                }
            };
        }
    }

    fn define(&mut self, pending: Option<Pending>, kind: DefinitionKind) {
        if let Some(pending) = pending {
            trace!("{}:{}: {} {}", pending.file, pending.line, kind.label(), pending.name);
            self.table.insert(Definition {
                name:   pending.name,
                file:   pending.file,
                line:   pending.line,
                column: pending.column,
                level:  pending.level,
                kind,
            });
        }
    }

    fn current(&self) -> &'t Token {
        // `parse_into` guarantees a trailing Eof, and nothing advances past it.
        let tokens: &'t [Token] = self.tokens;
        &tokens[self.index.min(tokens.len() - 1)]
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.current().kind == kind {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), WireError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected_token(kind.describe()))
        }
    }

    fn unexpected_token(&self, expected: &str) -> WireError {
        let token = self.current();
        parse_error(&format!("expected {}, got {}", expected, token.kind.describe()), token)
    }

    fn expect_word(&mut self, expected: &str) -> Result<String, WireError> {
        match &self.current().kind {
            TokenKind::Word(word) => {
                self.index += 1;
                Ok(word.clone())
            }
            _ => Err(self.unexpected_token(expected)),
        }
    }

    /// Reads a type name and resolves it against what is already defined.
    fn expect_type(&mut self) -> Result<(&'t Token, TypeId), WireError> {
        let token = self.current();
        let name = self.expect_word("type name")?;
        let id = self
            .table
            .find(&name)
            .ok_or_else(|| parse_error(&format!("unknown type: {}", quote(&name)), token))?;
        if !self.table.is_type(id) {
            return Err(parse_error(&format!("{} is not a type", quote(&name)), token));
        }
        Ok((token, id))
    }

    fn expect_integer(&mut self) -> Result<i64, WireError> {
        match self.current().kind {
            TokenKind::Integer(value) => {
                self.index += 1;
                Ok(value)
            }
            _ => Err(self.unexpected_token("integer")),
        }
    }

    fn parse_const(&mut self) -> Result<DefinitionKind, WireError> {
        let (type_token, type_id) = self.expect_type()?;
        let base = match &self.table.get(self.table.effective(type_id)).kind {
            DefinitionKind::Builtin(builtin) if *builtin != Builtin::Void => *builtin,
            other => {
                return Err(parse_error(&format!("invalid const type {}", other.label()), type_token));
            }
        };

        let value = match base {
            Builtin::Int { .. } => {
                let value_token = self.current();
                let value = self.expect_integer()?;
                self.check_range(type_id, value, value_token)?;
                ConstValue::Int(value)
            }
            Builtin::Bool => match self.expect_word("true or false")?.as_str() {
                "true" => ConstValue::Bool(true),
                "false" => ConstValue::Bool(false),
                _ => {
                    self.index -= 1;
                    return Err(self.unexpected_token("true or false"));
                }
            },
            Builtin::Float { .. } => match self.current().kind {
                TokenKind::Float(value) => {
                    self.index += 1;
                    ConstValue::Float(value)
                }
                TokenKind::Integer(value) => {
                    self.index += 1;
                    ConstValue::Float(value as f64)
                }
                _ => return Err(self.unexpected_token("number")),
            },
            Builtin::AString | Builtin::UString => match &self.current().kind {
                TokenKind::DoubleQuoted(text) => {
                    self.index += 1;
                    ConstValue::Str(text.clone())
                }
                _ => return Err(self.unexpected_token("double-quoted string")),
            },
            Builtin::Void => unreachable!("void was rejected above"),
        };

        Ok(DefinitionKind::Const { type_id, value })
    }

    fn parse_array(&mut self) -> Result<DefinitionKind, WireError> {
        self.expect(&TokenKind::OpenParen)?;
        let (item_token, item) = self.expect_type()?;
        if self.table.is_void(item) {
            return Err(parse_error("can not have an array of void", item_token));
        }
        let item_name = self.expect_word("identifier")?;
        self.expect(&TokenKind::CloseParen)?;
        Ok(DefinitionKind::Array { item, item_name })
    }

    fn parse_struct(&mut self) -> Result<DefinitionKind, WireError> {
        self.expect(&TokenKind::OpenBrace)?;

        let mut members: Vec<StructMember> = Vec::new();
        let mut optional = false;

        loop {
            let token = self.current();
            match &token.kind {
                TokenKind::Word(word) if word == "opt" => {
                    if optional {
                        return Err(parse_error("duplicate opt marker", token));
                    }
                    optional = true;
                    self.index += 1;
                }
                TokenKind::Word(_) => {
                    let (type_token, type_id) = self.expect_type()?;
                    if self.table.is_void(type_id) {
                        return Err(parse_error("can not have void as structure element", type_token));
                    }
                    let name_token = self.current();
                    let name = self.expect_word("identifier")?;
                    if members.iter().any(|member| member.name == name) {
                        return Err(parse_error(&format!("duplicate member {}", quote(&name)), name_token));
                    }
                    members.push(StructMember { name, type_id, optional });
                    optional = false;
                }
                TokenKind::CloseBrace if !optional => {
                    self.index += 1;
                    return Ok(DefinitionKind::Struct { members });
                }
                _ if optional => return Err(self.unexpected_token("type name")),
                _ => return Err(self.unexpected_token("identifier or '}'")),
            }
        }
    }

    fn parse_enum(&mut self) -> Result<DefinitionKind, WireError> {
        self.expect(&TokenKind::OpenBrace)?;

        let mut items = Vec::new();
        let mut next: i64 = 0;
        let mut max: u32 = 0;

        while let TokenKind::Word(name) = &self.current().kind {
            let mut value_token = self.current();
            self.index += 1;
            let value = if self.eat(&TokenKind::Equals) {
                value_token = self.current();
                self.expect_integer()?
            } else {
                next
            };
            let value = u32::try_from(value)
                .map_err(|_| parse_error("enum value too large", value_token))?;

            items.push(EnumItem { name: name.clone(), value });
            max = max.max(value);
            next = value as i64 + 1;
        }

        self.expect(&TokenKind::CloseBrace)?;
        Ok(DefinitionKind::Enum {
            items,
            num_bytes: enum_width(max),
        })
    }

    fn parse_union(&mut self) -> Result<DefinitionKind, WireError> {
        self.expect(&TokenKind::OpenParen)?;
        let (discriminant_token, discriminant) = self.expect_type()?;
        if !self.table.is_integer(discriminant) {
            return Err(parse_error(
                &format!("can't use {} as discriminator type", self.table.get(discriminant).name),
                discriminant_token,
            ));
        }
        let discriminant_name = self.expect_word("identifier")?;
        self.expect(&TokenKind::CloseParen)?;
        self.expect(&TokenKind::OpenBrace)?;

        let mut arms = Vec::new();
        loop {
            let token = self.current();
            let (label, value) = match &token.kind {
                TokenKind::Integer(value) => {
                    self.check_range(discriminant, *value, token)?;
                    (value.to_string(), *value)
                }
                TokenKind::Word(label) => {
                    let value = self.discriminator_value(discriminant, label).ok_or_else(|| {
                        parse_error(&format!("unknown discriminator value {}", quote(label)), token)
                    })?;
                    self.check_range(discriminant, value, token)?;
                    (label.clone(), value)
                }
                TokenKind::CloseBrace => {
                    self.index += 1;
                    break;
                }
                _ => return Err(self.unexpected_token("discriminator value or '}'")),
            };
            self.index += 1;

            self.expect(&TokenKind::Colon)?;
            let (_, type_id) = self.expect_type()?;
            let name = if self.table.is_void(type_id) {
                None
            } else {
                let name_token = self.current();
                let name = self.expect_word("identifier")?;
                if name == discriminant_name {
                    return Err(parse_error(
                        &format!("union member {} clashes with the discriminator", quote(&name)),
                        name_token,
                    ));
                }
                // Arms share one payload field per name.
                let redeclared = arms
                    .iter()
                    .any(|arm: &UnionArm| arm.name.as_deref() == Some(name.as_str()) && arm.type_id != type_id);
                if redeclared {
                    return Err(parse_error(
                        &format!("union member {} redeclared with a different type", quote(&name)),
                        name_token,
                    ));
                }
                Some(name)
            };
            arms.push(UnionArm { label, value, type_id, name });
        }

        Ok(DefinitionKind::Union {
            discriminant,
            discriminant_name,
            arms,
        })
    }

    /// Rejects integer literals that the resolved integer type can not hold.
    /// Enums are carried as `u32` values.
    fn check_range(&self, type_id: TypeId, value: i64, token: &Token) -> Result<(), WireError> {
        let resolved = self.table.get(self.table.effective(type_id));
        let (min, max) = match &resolved.kind {
            DefinitionKind::Builtin(Builtin::Int { size, signed: true }) => {
                let bits = 8 * *size as u32;
                (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
            }
            DefinitionKind::Builtin(Builtin::Int { size, signed: false }) => (0, (1i128 << (8 * *size as u32)) - 1),
            DefinitionKind::Enum { .. } => (0, u32::MAX as i128),
            _ => return Ok(()),
        };
        if (min..=max).contains(&(value as i128)) {
            Ok(())
        } else {
            Err(parse_error(&format!("value {} out of range for {}", value, resolved.name), token))
        }
    }

    /// A symbolic arm label is a member of the discriminant's enum, or else
    /// an integer constant declared earlier.
    fn discriminator_value(&self, discriminant: TypeId, label: &str) -> Option<i64> {
        if let DefinitionKind::Enum { items, .. } = &self.table.get(self.table.effective(discriminant)).kind {
            if let Some(item) = items.iter().find(|item| item.name == label) {
                return Some(item.value as i64);
            }
        }
        match &self.table.get(self.table.find(label)?).kind {
            DefinitionKind::Const { value: ConstValue::Int(value), .. } => Some(*value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize_str;

    fn parse(text: &str) -> Result<TypeTable, WireError> {
        parse_schema(&tokenize_str(text, "<string>")?)
    }

    fn error(text: &str) -> String {
        parse(text).unwrap_err().to_string()
    }

    fn kind<'t>(table: &'t TypeTable, name: &str) -> &'t DefinitionKind {
        &table.get(table.find(name).unwrap()).kind
    }

    #[test]
    fn aliases_and_arrays() {
        let table = parse("Id = uint32\nIds = array(Id id)").unwrap();
        let id = table.find("Id").unwrap();
        assert_eq!(kind(&table, "Id"), &DefinitionKind::Alias { target: table.find("uint32").unwrap() });
        assert_eq!(kind(&table, "Ids"), &DefinitionKind::Array { item: id, item_name: "id".to_owned() });
        assert_eq!(table.get(id).line, 1);
        assert_eq!(table.get(table.find("Ids").unwrap()).line, 2);
    }

    #[test]
    fn struct_members() {
        let table = parse("Name = struct { opt astring nickname int32 age }").unwrap();
        assert_eq!(
            kind(&table, "Name"),
            &DefinitionKind::Struct {
                members: vec![
                    StructMember { name: "nickname".to_owned(), type_id: 0, optional: true },
                    StructMember { name: "age".to_owned(), type_id: 8, optional: false },
                ],
            }
        );
    }

    #[test]
    fn enum_values() {
        let table = parse("E = enum { A B = 10 C D = 3 }").unwrap();
        match kind(&table, "E") {
            DefinitionKind::Enum { items, num_bytes } => {
                let values: Vec<(&str, u32)> = items.iter().map(|item| (item.name.as_str(), item.value)).collect();
                assert_eq!(values, [("A", 0), ("B", 10), ("C", 11), ("D", 3)]);
                assert_eq!(*num_bytes, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn constants() {
        let table = parse(
            "N = const int32 42\nF = const float64 2\nB = const bool true\nS = const astring \"hi\"\nId = uint8\nM = const Id 0x10",
        )
        .unwrap();
        assert_eq!(kind(&table, "N"), &DefinitionKind::Const { type_id: 8, value: ConstValue::Int(42) });
        assert_eq!(kind(&table, "F"), &DefinitionKind::Const { type_id: 12, value: ConstValue::Float(2.0) });
        assert_eq!(kind(&table, "B"), &DefinitionKind::Const { type_id: 10, value: ConstValue::Bool(true) });
        assert_eq!(kind(&table, "S"), &DefinitionKind::Const { type_id: 0, value: ConstValue::Str("hi".to_owned()) });
        let id = table.find("Id").unwrap();
        assert_eq!(kind(&table, "M"), &DefinitionKind::Const { type_id: id, value: ConstValue::Int(16) });
    }

    #[test]
    fn unions() {
        let table = parse(
            "Kind = enum { CIRCLE SQUARE NONE }\nSIDES = const int32 4\n\
             Shape = union (Kind kind) { CIRCLE: float64 radius SQUARE: int32 side NONE: void }\n\
             Raw = union (int8 tag) { 1: int32 a SIDES: astring b }",
        )
        .unwrap();
        match kind(&table, "Shape") {
            DefinitionKind::Union { discriminant, discriminant_name, arms } => {
                assert_eq!(*discriminant, table.find("Kind").unwrap());
                assert_eq!(discriminant_name, "kind");
                assert_eq!(arms.len(), 3);
                assert_eq!((arms[1].label.as_str(), arms[1].value), ("SQUARE", 1));
                assert_eq!(arms[2].name, None);
                assert_eq!(arms[2].type_id, table.find("void").unwrap());
            }
            other => panic!("unexpected {:?}", other),
        }
        match kind(&table, "Raw") {
            DefinitionKind::Union { arms, .. } => {
                assert_eq!((arms[0].label.as_str(), arms[0].value), ("1", 1));
                assert_eq!((arms[1].label.as_str(), arms[1].value), ("SIDES", 4));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn includes_record_level() {
        let tokens = tokenize_str(
            "# 1 \"main.wire\"\n# 1 \"common.wire\" 1\nId = uint32\n# 1 \"deep.wire\" 1\nX = int8\n# 2 \"common.wire\" 2\n# 2 \"main.wire\" 2\nP = struct { Id id }\n",
            "main.wire",
        )
        .unwrap();
        let table = parse_schema(&tokens).unwrap();

        let includes: Vec<(&str, usize)> = table
            .definitions()
            .iter()
            .filter(|def| matches!(def.kind, DefinitionKind::Include { .. }))
            .map(|def| (def.name.as_str(), def.level))
            .collect();
        assert_eq!(includes, [("common.wire", 1)]);
        assert_eq!(table.get(table.find("Id").unwrap()).level, 1);
        assert_eq!(table.get(table.find("X").unwrap()).level, 2);
        assert_eq!(table.get(table.find("P").unwrap()).level, 0);
        assert_eq!(table.get(table.find("Id").unwrap()).file, "common.wire");
    }

    #[test]
    fn diagnostics() {
        assert_eq!(error("B = struct { A a }\nA = int32"), "<string>:1:14: unknown type: \"A\".");
        assert_eq!(error("A = B"), "<string>:1:5: unknown base type \"B\".");
        assert_eq!(error("A int32"), "<string>:1:3: expected '=', got identifier.");
        assert_eq!(error("A = "), "<string>:1:5: expected identifier, got end of input.");
        assert_eq!(error("A = array(void v)"), "<string>:1:11: can not have an array of void.");
        assert_eq!(error("A = struct { void v }"), "<string>:1:14: can not have void as structure element.");
        assert_eq!(error("A = struct { opt opt int8 v }"), "<string>:1:18: duplicate opt marker.");
        assert_eq!(error("A = struct { opt }"), "<string>:1:18: expected type name, got '}'.");
        assert_eq!(error("A = union (float32 f) { }"), "<string>:1:12: can't use float32 as discriminator type.");
        assert_eq!(error("A = const void 1"), "<string>:1:11: invalid const type void.");
        assert_eq!(error("A = int8\nA = int16"), "<string>:2:1: redefinition of \"A\".");
        assert_eq!(error("N = const int8 1\nA = struct { N n }"), "<string>:2:14: \"N\" is not a type.");
        assert_eq!(error("E = enum { X = 4294967296 }"), "<string>:1:16: enum value too large.");
        assert_eq!(
            error("K = enum { A }\nU = union (K k) { B: int8 b }"),
            "<string>:2:19: unknown discriminator value \"B\"."
        );
        assert_eq!(error("A = const bool 1"), "<string>:1:16: expected true or false, got integer.");
    }

    #[test]
    fn integer_ranges() {
        assert_eq!(error("A = const uint8 300"), "<string>:1:17: value 300 out of range for uint8.");
        assert_eq!(error("A = const int8 128"), "<string>:1:16: value 128 out of range for int8.");
        assert_eq!(error("A = const uint32 4294967296"), "<string>:1:18: value 4294967296 out of range for uint32.");
        assert_eq!(error("Id = uint16\nA = const Id 65536"), "<string>:2:14: value 65536 out of range for uint16.");
        assert_eq!(
            error("U = union (uint8 tag) { 1: int32 a 256: int8 b }"),
            "<string>:1:36: value 256 out of range for uint8."
        );
        assert_eq!(
            error("BIG = const int32 400\nU = union (uint8 t) { BIG: void }"),
            "<string>:2:23: value 400 out of range for uint8."
        );
        assert_eq!(
            error("K = enum { A }\nU = union (K k) { 4294967296: int8 b }"),
            "<string>:2:19: value 4294967296 out of range for K."
        );

        let table = parse(
            "A = const uint8 255\nB = const int8 127\nC = const uint16 0\nU = union (int8 t) { 0: void 127: void }",
        )
        .unwrap();
        assert_eq!(kind(&table, "A"), &DefinitionKind::Const { type_id: 2, value: ConstValue::Int(255) });
        assert_eq!(kind(&table, "B"), &DefinitionKind::Const { type_id: 6, value: ConstValue::Int(127) });
    }

    #[test]
    fn union_member_names() {
        assert_eq!(
            error("U = union (uint8 t) { 1: int32 v 2: astring v }"),
            "<string>:1:45: union member \"v\" redeclared with a different type."
        );
        assert_eq!(
            error("U = union (uint8 t) { 1: int32 t }"),
            "<string>:1:32: union member \"t\" clashes with the discriminator."
        );
        let table = parse("U = union (uint8 t) { 1: int32 v 2: int32 v 3: void }").unwrap();
        match kind(&table, "U") {
            DefinitionKind::Union { arms, .. } => {
                let names: Vec<Option<&str>> = arms.iter().map(|arm| arm.name.as_deref()).collect();
                assert_eq!(names, [Some("v"), Some("v"), None]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn slices_without_eof_terminate() {
        let mut tokens = tokenize_str("# 1 \"main.wire\"\n# 1 \"common.wire\" 1\nId = uint32\n# 2 \"main.wire\" 2\n", "main.wire").unwrap();
        assert_eq!(tokens.pop().map(|token| token.kind), Some(TokenKind::Eof));
        assert_eq!(tokens.last().map(|token| &token.kind), Some(&TokenKind::IncludeExit));
        let table = parse_schema(&tokens).unwrap();
        assert_eq!(table.get(table.find("Id").unwrap()).level, 1);

        let mut tokens = tokenize_str("A = struct { int8 a", "<string>").unwrap();
        tokens.pop();
        assert_eq!(
            parse_schema(&tokens).unwrap_err().to_string(),
            "<string>:1:19: expected identifier or '}', got end of input."
        );
    }
}
