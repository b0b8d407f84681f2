use std::{thread::sleep, time::{Duration, Instant}};

use crate::Coords;
use crate::arena::{Arena, Bounds, Cell, Hit};
use crate::term::{Attr, Surface, TermManager};
use crate::snake::{Snake, Step, Direction::{*, self}};

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{debug, info, warn};
use rand::Rng;

const FRAME_MS: u64 = 90;
const INITIAL_SNAKE_LENGTH: u16 = 15;
const INITIAL_HEAD: Coords = (12, 20);
const GROWTH_PER_FRUIT: u32 = 6;

// (height, width, top, left) in screen cells
const GAME_WINDOW: (u16, u16, u16, u16) = (23, 45, 1, 1);
const GAME_OVER_WINDOW: (u16, u16, u16, u16) = (7, 22, 7, 12);
const SCORE_COL: i16 = 3;

const SNAKE_BODY_CHAR: char = ':';
const FRUIT_CHAR: char = 'O';

const TITLE: &[&str] = &[
    "                                   ",
    "  ####  #   #   ###   #   #  ##### ",
    " #      ##  #  #   #  #  #   #     ",
    "  ###   # # #  #####  ###    ####  ",
    "     #  #  ##  #   #  #  #   #     ",
    " ####   #   #  #   #  #   #  ##### ",
    "                                   ",
];
const TITLE_ROW: i16 = 5;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    Intro,
    Playing,
    GameOver,
    Exit,
}

/// A key press, once it's been given a meaning.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Input {
    Turn(Direction),
    Begin,
    Quit,
    Restart,
    Pause,
    Interrupt,
}

impl Input {
    pub fn from_key(ev: &KeyEvent) -> Option<Input> {
        if ev.code == KeyCode::Char('c') && ev.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(Input::Interrupt);
        }

        match ev.code {
            KeyCode::Char('w') | KeyCode::Up => Some(Input::Turn(North)),
            KeyCode::Char('a') | KeyCode::Left => Some(Input::Turn(West)),
            KeyCode::Char('s') | KeyCode::Down => Some(Input::Turn(South)),
            KeyCode::Char('d') | KeyCode::Right => Some(Input::Turn(East)),
            KeyCode::Char('b') => Some(Input::Begin),
            KeyCode::Char('q') => Some(Input::Quit),
            KeyCode::Char('r') => Some(Input::Restart),
            KeyCode::Char('p') | KeyCode::Esc => Some(Input::Pause),
            _ => None,
        }
    }
}

/// Everything the renderer needs to know about one tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Tick {
    pub step: Option<Step>,
    pub hit: Hit,
    pub new_fruit: Option<Coords>,
}

pub struct GameState {
    screen: Screen,
    snake: Snake,
    fruit: Option<Coords>,
    score: u32,
    arena: Arena,
}

impl GameState {
    pub fn new(bounds: Bounds) -> Self {
        let snake = Snake::new(INITIAL_HEAD, INITIAL_SNAKE_LENGTH, East);
        let mut arena = Arena::new(bounds);
        arena.place_snake(&snake);

        GameState { screen: Screen::Intro, snake, fruit: None, score: 0, arena }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn fruit(&self) -> Option<Coords> {
        self.fruit
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Title screen: only `b` starts a game.
    pub fn handle_intro(&mut self, input: Option<Input>) {
        match input {
            Some(Input::Begin) => {
                *self = GameState::new(self.arena.bounds());
                self.screen = Screen::Playing;
                info!("game started");
            },
            Some(Input::Quit) | Some(Input::Interrupt) => self.screen = Screen::Exit,
            _ => {}
        }
    }

    pub fn handle_game_over(&mut self, input: Option<Input>) {
        match input {
            Some(Input::Quit) | Some(Input::Interrupt) => self.screen = Screen::Exit,
            Some(Input::Restart) => self.screen = Screen::Intro,
            _ => {}
        }
    }

    /// Runs one frame of play: turn, move, classify, then react.
    pub fn tick<R: Rng + ?Sized>(&mut self, input: Option<Input>, rng: &mut R) -> Tick {
        match input {
            Some(Input::Quit) => {
                info!("quit with score {}", self.score);
                self.screen = Screen::GameOver;
                return Tick { step: None, hit: Hit::Nothing, new_fruit: None };
            },
            Some(Input::Interrupt) => {
                self.screen = Screen::Exit;
                return Tick { step: None, hit: Hit::Nothing, new_fruit: None };
            },
            Some(Input::Turn(dir)) => {
                if !self.snake.set_direction(dir) {
                    debug!("ignoring reversal to {:?}", dir);
                }
            },
            _ => {}
        }

        let step = self.snake.move_step();
        self.arena.apply_step(&step);
        let hit = self.arena.classify(step.new_head);
        self.arena.set(step.new_head, Cell::Head);

        let mut new_fruit = None;
        if self.fruit.is_none() {
            new_fruit = self.arena.spawn_fruit(rng);
            if new_fruit.is_none() {
                warn!("no empty cell left for fruit, skipping this tick");
            }
            self.fruit = new_fruit;
        }

        match hit {
            Hit::Fruit => {
                self.score += 1;
                self.fruit = None;
                self.snake.grow(GROWTH_PER_FRUIT);
                debug!("ate fruit at {:?}, score {}", step.new_head, self.score);
            },
            Hit::Collision => {
                info!("crashed at {:?} with score {}", step.new_head, self.score);
                self.screen = Screen::GameOver;
            },
            Hit::Nothing => {}
        }

        Tick { step: Some(step), hit, new_fruit }
    }
}

pub struct SnakeGame<'a> {
    term: &'a mut TermManager,
    state: GameState,
    surface: Surface,
    paused: bool,
}

impl<'a> SnakeGame<'a> {
    pub fn new(term: &'a mut TermManager) -> Self {
        let (h, w, top, left) = GAME_WINDOW;
        let surface = Surface::new(h, w, top, left);
        let state = GameState::new(Bounds::from_surface(&surface));

        SnakeGame { term, state, surface, paused: false }
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            let screen = self.state.screen();
            debug!("entering {:?}", screen);

            match screen {
                Screen::Intro => self.show_intro()?,
                Screen::Playing => self.play()?,
                Screen::GameOver => self.show_game_over()?,
                Screen::Exit => return Ok(()),
            }
        }
    }

    ///////////////////////////////////////////////////////////////////////////

    fn open_game_window(&mut self) -> Result<()> {
        let (h, w, top, left) = GAME_WINDOW;
        self.term.clear()?;
        self.surface = self.term.new_surface(h, w, top, left)?;
        self.term.draw_border(&self.surface)
    }

    fn show_intro(&mut self) -> Result<()> {
        self.open_game_window()?;

        for (i, line) in TITLE.iter().enumerate() {
            self.term.write_str(&self.surface, (TITLE_ROW + i as i16, 5), line, Attr::Reverse)?;
        }

        let lines = [
            "Arrow keys or WASD to move",
            "P or Esc to pause",
            "",
            "Press \"b\" to begin playing.",
        ];
        for (i, line) in lines.iter().enumerate() {
            self.term.write_str(&self.surface, (14 + i as i16, 9), line, Attr::Normal)?;
        }
        self.term.refresh()?;

        while self.state.screen() == Screen::Intro {
            let key = self.term.read_key_blocking()?;
            self.state.handle_intro(Input::from_key(&key));
        }

        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.open_game_window()?;
        self.paused = false;
        self.print_snake()?;
        self.print_score()?;
        self.term.refresh()?;

        let frame = Duration::from_millis(FRAME_MS);
        let mut rng = rand::thread_rng();

        while self.state.screen() == Screen::Playing {
            let started = Instant::now();
            let input = self.term.poll_key()?.as_ref().and_then(Input::from_key);

            match input {
                Some(Input::Pause) => self.toggle_pause()?,
                Some(Input::Quit) | Some(Input::Interrupt) if self.paused => {
                    self.term.hide_message()?;
                    self.paused = false;
                    self.state.tick(input, &mut rng);
                },
                _ if self.paused => {},
                _ => {
                    let tick = self.state.tick(input, &mut rng);
                    self.print_tick(&tick)?;
                }
            }

            sleep(frame.saturating_sub(started.elapsed()));
        }

        Ok(())
    }

    fn show_game_over(&mut self) -> Result<()> {
        let (h, w, top, left) = GAME_OVER_WINDOW;
        self.term.show_message(Surface::new(h, w, top, left), &[
            ("GAME OVER", Attr::Reverse),
            ("Type \"q\" to exit", Attr::Normal),
            ("or \"r\" to restart", Attr::Normal),
        ])?;

        while self.state.screen() == Screen::GameOver {
            let key = self.term.read_key_blocking()?;
            self.state.handle_game_over(Input::from_key(&key));
        }

        self.term.hide_message()
    }

    fn toggle_pause(&mut self) -> Result<()> {
        if !self.paused {
            let (h, w, top, left) = GAME_OVER_WINDOW;
            self.term.show_message(Surface::new(h, w, top, left), &[
                ("Paused", Attr::Reverse),
                ("P or Esc to resume", Attr::Normal),
            ])?;
        } else {
            self.term.hide_message()?;
        }

        self.paused = !self.paused;
        Ok(())
    }

    fn print_snake(&mut self) -> Result<()> {
        let snake = self.state.snake();
        let body: Vec<Coords> = snake.body().iter().copied().collect();
        let (head, head_char) = (snake.head(), snake.head_char());

        for pos in body {
            self.term.write_cell(&self.surface, pos, SNAKE_BODY_CHAR, Attr::Body)?;
        }
        self.term.write_cell(&self.surface, head, head_char, Attr::Head)
    }

    fn print_tick(&mut self, tick: &Tick) -> Result<()> {
        if let Some(step) = tick.step {
            if let Some(tail) = step.old_tail {
                self.term.write_cell(&self.surface, tail, ' ', Attr::Normal)?;
            }
            self.term.write_cell(&self.surface, step.old_head, SNAKE_BODY_CHAR, Attr::Body)?;
            let head_char = self.state.snake().head_char();
            self.term.write_cell(&self.surface, step.new_head, head_char, Attr::Head)?;
        }

        if let Some(fruit) = tick.new_fruit {
            self.term.write_cell(&self.surface, fruit, FRUIT_CHAR, Attr::Fruit)?;
        }

        self.print_score()?;
        self.term.refresh()
    }

    fn print_score(&mut self) -> Result<()> {
        let (height, _, _, _) = self.surface.bounds();
        let text = format!(" Score: {} ", self.state.score());
        self.term.write_str(&self.surface, (height as i16 - 1, SCORE_COL), &text, Attr::Normal)
    }
}
