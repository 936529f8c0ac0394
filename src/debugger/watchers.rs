/// Expressions evaluated and shown every time the debuggee pauses.
#[derive(Debug, Default, Clone)]
pub struct WatchList {
    expressions: Vec<String>,
}

impl WatchList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, expression: impl Into<String>) {
        self.expressions.push(expression.into());
    }

    /// Removes by exact expression text, or by index when `target` is a
    /// number that is not itself a watched expression.
    pub fn remove(&mut self, target: &str) -> Option<String> {
        if let Some(index) = self.expressions.iter().position(|expr| expr == target) {
            return Some(self.expressions.remove(index));
        }
        let index = target.trim().parse::<usize>().ok()?;
        if index < self.expressions.len() {
            Some(self.expressions.remove(index))
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.expressions.iter()
    }

    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }
}
