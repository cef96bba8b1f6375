//! Matching a solution call against the student's calls of the same name.

use crate::checks::{Check, CheckResult};
use crate::compare::compare_argument;
use crate::equality::EqualityMode;
use crate::error::AuthoringError;
use crate::feedback::{ordinal, FeedbackMessage, Outcome};
use crate::index::CallSite;
use crate::state::State;

/// Checks that the student makes the `index`-th call of `name` found in
/// the solution, with the same arguments.
#[derive(Debug, Clone)]
pub struct CallCheck {
    name: String,
    index: usize,
    args: Option<Vec<usize>>,
    keywords: Option<Vec<String>>,
    eq_condition: String,
    do_eval: bool,
    not_called_msg: Option<String>,
    incorrect_msg: Option<String>,
}

impl CallCheck {
    /// Check of the first call of `name`, comparing every argument by value.
    pub fn new(name: impl Into<String>) -> Self {
        CallCheck {
            name: name.into(),
            index: 1,
            args: None,
            keywords: None,
            eq_condition: "equal".to_string(),
            do_eval: true,
            not_called_msg: None,
            incorrect_msg: None,
        }
    }

    /// 1-based occurrence of the call in the solution.
    pub fn index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// 0-based positional arguments to compare. Defaults to all of them.
    pub fn args(mut self, args: Vec<usize>) -> Self {
        self.args = Some(args);
        self
    }

    /// Keyword arguments to compare. Defaults to all of them.
    pub fn keywords<S: Into<String>>(mut self, keywords: impl IntoIterator<Item = S>) -> Self {
        self.keywords = Some(keywords.into_iter().map(Into::into).collect());
        self
    }

    /// `"equal"` or `"equivalent"`.
    pub fn eq_condition(mut self, condition: impl Into<String>) -> Self {
        self.eq_condition = condition.into();
        self
    }

    pub fn do_eval(mut self, do_eval: bool) -> Self {
        self.do_eval = do_eval;
        self
    }

    pub fn not_called_msg(mut self, msg: impl Into<String>) -> Self {
        self.not_called_msg = Some(msg.into());
        self
    }

    pub fn incorrect_msg(mut self, msg: impl Into<String>) -> Self {
        self.incorrect_msg = Some(msg.into());
        self
    }

    fn not_called(&self, student_name: &str) -> Outcome {
        let message = match &self.not_called_msg {
            Some(msg) => FeedbackMessage::new(msg.as_str())
                .with_slot("name", student_name)
                .render()
                .to_string(),
            None if self.index == 1 => format!("Have you called `{}()`?", student_name),
            None => format!(
                "The system wants to check the {} call of `{}()`, but hasn't found it; have another look at your code.",
                ordinal(self.index),
                student_name
            ),
        };
        Outcome::fail(message, None)
    }

    /// Compares one candidate. Returns `None` when every requested argument
    /// matched, or the feedback describing the first mismatch.
    fn attempt(
        &self,
        state: &State,
        mode: EqualityMode,
        student_name: &str,
        site: &CallSite,
        solution: &CallSite,
        args: &[usize],
        keywords: &[String],
    ) -> Result<Option<FeedbackMessage>, AuthoringError> {
        let mut msg = incorrect_message();
        msg.set_slot("name", student_name);
        msg.set_slot("line", site.line.to_string());

        let positional = args
            .iter()
            .map(|&pos| (("argument", ordinal(pos + 1)), &site.args[pos], &solution.args[pos]));
        let named = keywords
            .iter()
            .map(|kw| (("keyword", kw.clone()), &site.keywords[kw], &solution.keywords[kw]));

        for ((slot, label), student_arg, solution_arg) in positional.chain(named) {
            let cmp = compare_argument(state, student_arg, solution_arg, mode, self.do_eval)?;
            if !cmp.matched {
                msg.set_slot(slot, label);
                if let (Some(expected), Some(result)) = (cmp.expected, cmp.result) {
                    msg.set_slot("expected", expected);
                    msg.set_slot("result", result);
                }
                return Ok(Some(msg));
            }
        }
        Ok(None)
    }
}

fn incorrect_message() -> FeedbackMessage {
    let mut msg = FeedbackMessage::new("Did you call `${name}()` with the correct arguments?");
    msg.cond_append("line", " The call on line ${line} has wrong arguments.");
    msg.cond_append("argument", " The ${argument} argument seems to be incorrect.");
    msg.cond_append("keyword", " Keyword `${keyword}` seems to be incorrect.");
    msg.cond_append("expected", " Expected `${expected}`, but got ${result}.");
    msg
}

fn is_compatible(site: &CallSite, args: &[usize], keywords: &[String]) -> bool {
    args.iter().all(|&pos| pos < site.args.len())
        && keywords.iter().all(|kw| site.keywords.contains_key(kw))
}

impl Check for CallCheck {
    fn run(&self, state: &mut State) -> CheckResult {
        let mode: EqualityMode = self.eq_condition.parse()?;
        state.extract_function_calls();

        let name = self.name.as_str();
        let student_name = state.student.imports.spelling(name);
        let not_in_solution = || AuthoringError::CallNotInSolution {
            name: name.to_string(),
            index: self.index,
        };
        let check_index = self.index.checked_sub(1).ok_or_else(not_in_solution)?;
        let solution = state
            .solution_calls(name)
            .get(check_index)
            .cloned()
            .ok_or_else(not_in_solution)?;

        let student_count = state.student_calls(name).len();
        if student_count == 0 {
            return Ok(self.not_called(&student_name));
        }

        let args = match &self.args {
            Some(args) => args.clone(),
            None => (0..solution.args.len()).collect(),
        };
        let keywords = match &self.keywords {
            Some(keywords) => keywords.clone(),
            None => solution.keywords.keys().cloned().collect(),
        };
        if let Some(&position) = args.iter().find(|&&pos| pos >= solution.args.len()) {
            return Err(AuthoringError::ArgumentNotInSolution {
                name: name.to_string(),
                position,
            });
        }
        if let Some(keyword) = keywords.iter().find(|kw| !solution.keywords.contains_key(*kw)) {
            return Err(AuthoringError::KeywordNotInSolution {
                name: name.to_string(),
                keyword: keyword.clone(),
            });
        }
        if args.is_empty() && keywords.is_empty() {
            return Ok(Outcome::Pass);
        }

        let options = state.get_options(name, 0..student_count, check_index);
        let mut last_attempt: Option<(FeedbackMessage, usize)> = None;
        let mut accepted = None;
        for position in options {
            let site = &state.student_calls(name)[position];
            if !is_compatible(site, &args, &keywords) {
                log::debug!("call {} of {}() skipped: incompatible arguments", position, name);
                continue;
            }
            match self.attempt(state, mode, &student_name, site, &solution, &args, &keywords)? {
                None => {
                    accepted = Some(position);
                    break;
                }
                Some(msg) => {
                    log::debug!("call {} of {}() does not match", position, name);
                    last_attempt = Some((msg, site.line));
                }
            }
        }

        if let Some(position) = accepted {
            state.set_used(name, position, check_index);
            return Ok(Outcome::Pass);
        }

        let line = last_attempt.as_ref().map(|(_, line)| *line);
        let message = match (&self.incorrect_msg, last_attempt) {
            (Some(custom), _) => {
                let mut msg = FeedbackMessage::new(custom.as_str()).with_slot("name", student_name);
                if let Some(line) = line {
                    msg.set_slot("line", line.to_string());
                }
                msg
            }
            (None, Some((msg, _))) => msg,
            (None, None) => incorrect_message().with_slot("name", student_name),
        };
        Ok(Outcome::Fail(message.into_feedback(line)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraderConfig;
    use pretty_assertions::assert_eq;

    fn run(student: &str, solution: &str, check: CallCheck) -> CheckResult {
        let mut state = State::from_sources(student, solution, GraderConfig::default()).unwrap();
        check.run(&mut state)
    }

    fn message(outcome: Outcome) -> String {
        match outcome {
            Outcome::Fail(feedback) => feedback.message,
            Outcome::Pass => panic!("expected a failure"),
        }
    }

    #[test]
    fn matching_call_passes() {
        let outcome = run("round(2.567, 2)", "round(2.567, 2)", CallCheck::new("round")).unwrap();
        assert_eq!(outcome, Outcome::Pass);
    }

    #[test]
    fn wrong_argument_names_position_and_values() {
        let outcome = run("x = 3\nround(2.567, x)", "round(2.567, 2)", CallCheck::new("round")).unwrap();
        assert_eq!(
            message(outcome),
            "Did you call `round()` with the correct arguments? The call on line 2 has wrong arguments. \
             The second argument seems to be incorrect. Expected `2`, but got `3`."
        );
    }

    #[test]
    fn wrong_keyword_is_named() {
        let outcome = run(
            "round(2.567, ndigits=1)",
            "round(2.567, ndigits=2)",
            CallCheck::new("round"),
        )
        .unwrap();
        let text = message(outcome);
        assert!(text.contains("Keyword `ndigits` seems to be incorrect."));
        assert!(!text.contains("argument seems"));
    }

    #[test]
    fn student_spelling_uses_alias() {
        let outcome = run(
            "import numpy as np\nnp.mean([1])",
            "import numpy\nnumpy.std([1])",
            CallCheck::new("numpy.std"),
        )
        .unwrap();
        assert_eq!(message(outcome), "Have you called `np.std()`?");
    }

    #[test]
    fn later_occurrence_not_found() {
        let solution = "len([1])\nlen([1, 2])";
        let outcome = run("print(1)", solution, CallCheck::new("len").index(2)).unwrap();
        assert_eq!(
            message(outcome),
            "The system wants to check the second call of `len()`, but hasn't found it; \
             have another look at your code."
        );
        let custom = CallCheck::new("len").index(2).not_called_msg("Call `${name}()` twice.");
        assert_eq!(message(run("print(1)", solution, custom).unwrap()), "Call `len()` twice.");
    }

    #[test]
    fn authoring_errors() {
        assert!(matches!(
            run("len([])", "len([])", CallCheck::new("len").index(2)),
            Err(AuthoringError::CallNotInSolution { index: 2, .. })
        ));
        assert!(matches!(
            run("len([])", "len([])", CallCheck::new("len").args(vec![1])),
            Err(AuthoringError::ArgumentNotInSolution { position: 1, .. })
        ));
        assert!(matches!(
            run("len([])", "len([])", CallCheck::new("len").keywords(["key"])),
            Err(AuthoringError::KeywordNotInSolution { .. })
        ));
        assert!(matches!(
            run("len([])", "len([])", CallCheck::new("len").eq_condition("same")),
            Err(AuthoringError::InvalidEqualityCondition(_))
        ));
    }

    #[test]
    fn no_compatible_candidate_uses_base_message() {
        let outcome = run("round(2.5)", "round(2.567, 2)", CallCheck::new("round")).unwrap();
        assert_eq!(
            outcome,
            Outcome::fail("Did you call `round()` with the correct arguments?", None)
        );
    }
}
