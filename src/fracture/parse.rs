//! Solver output parser
//!
//! A tokenizer feeds a four-state machine:
//!
//! - `ReadingVertex`: `(x,y,z)` tuples until the `v` delimiter
//! - `FaceClosed`: between face tuples, until the `f` delimiter
//! - `ReadingFaceIndex`: inside a face tuple
//! - `CellClosed`: reading the three centroid numbers
//!
//! A cell is complete once its centroid is read. Input ending inside a cell
//! drops that cell. Malformed input yields one error and ends the stream.

use glam::Vec3;

use crate::error::{FractureError, Result};

/// One cell as written by the solver, still in world space
#[derive(Debug, Clone, PartialEq)]
pub struct RawCell {
    /// Cell vertex positions
    pub vertices: Vec<Vec3>,
    /// Faces as index rings into `vertices`
    pub faces: Vec<Vec<u32>>,
    /// Cell centroid
    pub centroid: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    Open,
    Close,
    Comma,
    Number(&'a str),
    Word(&'a str),
}

/// Splits solver output into tokens, tracking line numbers
struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() && pred(bytes[self.pos]) {
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            if bytes[self.pos] == b'\n' {
                self.line += 1;
            }
            self.pos += 1;
        }

        let c = *bytes.get(self.pos)?;
        let token = match c {
            b'(' => Token::Open,
            b')' => Token::Close,
            b',' => Token::Comma,
            b'0'..=b'9' | b'-' | b'+' | b'.' => {
                return Some(Token::Number(self.take_while(|b| {
                    b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E')
                })));
            }
            _ => {
                return Some(Token::Word(self.take_while(|b| {
                    !b.is_ascii_whitespace() && !matches!(b, b'(' | b')' | b',')
                })));
            }
        };
        self.pos += 1;
        Some(token)
    }
}

fn parse_number(text: &str) -> std::result::Result<f32, String> {
    text.parse::<f32>()
        .map_err(|_| format!("invalid number '{}'", text))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ReadingVertex,
    ReadingFaceIndex,
    FaceClosed,
    CellClosed,
}

/// Streaming parser over solver output
///
/// # Example
///
/// ```
/// use particle_fracture::fracture::parse::CellParser;
///
/// let text = "(0,0,0) (1,0,0) (0,1,0) v (0,1,2) f 0.3 0.3 0\n";
/// let cells: Vec<_> = CellParser::new(text).collect();
///
/// assert_eq!(cells.len(), 1);
/// assert_eq!(cells[0].as_ref().unwrap().faces, vec![vec![0, 1, 2]]);
/// ```
pub struct CellParser<'a> {
    lexer: Lexer<'a>,
    finished: bool,
    truncated: bool,
}

impl<'a> CellParser<'a> {
    /// Create a parser over the full solver output
    pub fn new(input: &'a str) -> Self {
        Self {
            lexer: Lexer::new(input),
            finished: false,
            truncated: false,
        }
    }

    /// Whether the input ended inside a cell
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    fn error(&mut self, message: impl Into<String>) -> Option<Result<RawCell>> {
        self.finished = true;
        Some(Err(FractureError::Parse {
            line: self.lexer.line,
            message: message.into(),
        }))
    }

    /// Read `x , y , z )` after an opening parenthesis
    fn vertex(&mut self) -> std::result::Result<Option<Vec3>, String> {
        let mut co = [0.0f32; 3];
        for (i, slot) in co.iter_mut().enumerate() {
            if i > 0 {
                match self.lexer.next() {
                    Some(Token::Comma) => {}
                    None => return Ok(None),
                    Some(other) => return Err(format!("expected ',' in vertex, found {:?}", other)),
                }
            }
            match self.lexer.next() {
                Some(Token::Number(text)) => *slot = parse_number(text)?,
                None => return Ok(None),
                Some(other) => return Err(format!("expected vertex coordinate, found {:?}", other)),
            }
        }
        match self.lexer.next() {
            Some(Token::Close) => Ok(Some(Vec3::from_array(co))),
            None => Ok(None),
            Some(other) => Err(format!("expected ')' after vertex, found {:?}", other)),
        }
    }

    /// Read the three centroid numbers
    fn centroid(&mut self) -> std::result::Result<Option<Vec3>, String> {
        let mut co = [0.0f32; 3];
        for slot in &mut co {
            match self.lexer.next() {
                Some(Token::Number(text)) => *slot = parse_number(text)?,
                None => return Ok(None),
                Some(other) => return Err(format!("expected centroid coordinate, found {:?}", other)),
            }
        }
        Ok(Some(Vec3::from_array(co)))
    }
}

impl Iterator for CellParser<'_> {
    type Item = Result<RawCell>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut state = State::ReadingVertex;
        let mut vertices = Vec::new();
        let mut faces: Vec<Vec<u32>> = Vec::new();
        let mut ring = Vec::new();

        loop {
            if state == State::CellClosed {
                return match self.centroid() {
                    Ok(Some(centroid)) => Some(Ok(RawCell {
                        vertices,
                        faces,
                        centroid,
                    })),
                    Ok(None) => {
                        self.truncated = true;
                        self.finished = true;
                        None
                    }
                    Err(message) => self.error(message),
                };
            }

            let Some(token) = self.lexer.next() else {
                // end of input between cells is the normal end of stream
                self.truncated = state != State::ReadingVertex || !vertices.is_empty();
                self.finished = true;
                return None;
            };

            state = match (state, token) {
                (State::ReadingVertex, Token::Open) => match self.vertex() {
                    Ok(Some(v)) => {
                        vertices.push(v);
                        State::ReadingVertex
                    }
                    Ok(None) => {
                        self.truncated = true;
                        self.finished = true;
                        return None;
                    }
                    Err(message) => return self.error(message),
                },
                (State::ReadingVertex, Token::Word("v")) => State::FaceClosed,
                (State::FaceClosed, Token::Open) => {
                    ring.clear();
                    State::ReadingFaceIndex
                }
                (State::FaceClosed, Token::Word("f")) => State::CellClosed,
                (State::ReadingFaceIndex, Token::Number(text)) => {
                    let Ok(index) = text.parse::<u32>() else {
                        return self.error(format!("invalid face index '{}'", text));
                    };
                    if index as usize >= vertices.len() {
                        return self.error(format!(
                            "face index {} out of range for {} vertices",
                            index,
                            vertices.len()
                        ));
                    }
                    ring.push(index);
                    State::ReadingFaceIndex
                }
                (State::ReadingFaceIndex, Token::Comma) => State::ReadingFaceIndex,
                (State::ReadingFaceIndex, Token::Close) => {
                    faces.push(std::mem::take(&mut ring));
                    State::FaceClosed
                }
                (state, token) => {
                    return self.error(format!("unexpected {:?} while {:?}", token, state));
                }
            };
        }
    }
}

/// Parse all complete cells
///
/// Returns the cells read before the first error together with that error,
/// if any, and whether the stream ended inside a cell.
pub fn parse_cells(input: &str) -> (Vec<RawCell>, Option<FractureError>, bool) {
    let mut parser = CellParser::new(input);
    let mut cells = Vec::new();
    let mut error = None;
    for item in parser.by_ref() {
        match item {
            Ok(cell) => cells.push(cell),
            Err(e) => error = Some(e),
        }
    }
    (cells, error, parser.truncated())
}
