use std::io::BufRead;

use app_spec::{
    Document, Environment, Field, FieldType, Section, Values, Wizard, WizardError, WizardSection,
    evaluate_sections, validate_value,
};

use crate::CliResult;
use crate::wizard::{Answer, AnswerParseError, PromptContext, Verbosity, WizardPresenter};

enum Flow {
    Next,
    Back,
}

/// Walks a document section by section, prompting for every input.
pub struct Runner<'a, R> {
    document: &'a Document,
    input: R,
    presenter: WizardPresenter,
    values: Values,
}

impl<'a, R: BufRead> Runner<'a, R> {
    pub fn new(document: &'a Document, values: Values, input: R, verbosity: Verbosity) -> Self {
        Self {
            document,
            input,
            presenter: WizardPresenter::new(verbosity),
            values,
        }
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    pub fn presenter(&self) -> &WizardPresenter {
        &self.presenter
    }

    pub fn run(&mut self) -> CliResult<()> {
        let document = self.document;
        self.presenter.show_header(document);
        for (index, section) in document.sections.iter().enumerate() {
            match section {
                Section::Text(text) => {
                    self.presenter.show_heading(text.heading.as_deref());
                    self.presenter.show_text(&text.body);
                }
                Section::Form(form) => {
                    self.presenter.show_heading(form.heading.as_deref());
                    self.collect(&form.fields)?;
                }
                Section::Calculator(calculator) => {
                    self.collect(&calculator.inputs)?;
                    self.show_evaluated(index);
                }
                Section::Wizard(wizard) => {
                    self.presenter.show_heading(wizard.heading.as_deref());
                    self.run_wizard(wizard)?;
                }
                Section::Result(_) => self.show_evaluated(index),
            }
        }
        Ok(())
    }

    /// Ask again for the named fields, discarding what was captured.
    pub fn reask(&mut self, names: &[&str]) -> CliResult<()> {
        let document = self.document;
        for name in names {
            if let Some(field) = document.field(name) {
                self.values.remove(*name);
                self.ask(field, false)?;
            }
        }
        Ok(())
    }

    fn collect(&mut self, fields: &[Field]) -> CliResult<()> {
        for field in fields {
            if self.values.contains_key(&field.name) {
                continue;
            }
            self.ask(field, false)?;
        }
        Ok(())
    }

    fn run_wizard(&mut self, section: &WizardSection) -> CliResult<()> {
        let mut wizard = Wizard::new(section);
        while let Some(step) = wizard.current_step() {
            let (position, total) = wizard.progress();
            self.presenter.show_step(position, total, step);

            let mut back = false;
            for field in &step.fields {
                if let Flow::Back = self.ask(field, true)? {
                    back = true;
                    break;
                }
            }
            if back {
                wizard.back();
                continue;
            }

            match wizard.next(&self.values) {
                Ok(_) => {}
                Err(WizardError::Validation(errors)) => self.presenter.show_field_errors(&errors),
                Err(WizardError::Completed) => break,
            }
        }
        Ok(())
    }

    fn ask(&mut self, field: &Field, in_wizard: bool) -> CliResult<Flow> {
        if matches!(field.kind, FieldType::Hidden) {
            if let Some(default) = &field.default_value
                && !self.values.contains_key(&field.name)
            {
                self.values.insert(field.name.clone(), default.clone());
            }
            // hidden values are never prompted for; a failing one ends the run
            if let Some(error) = validate_value(field, self.values.get(&field.name)) {
                return Err(format!("hidden field {}: {}", field.name, error.message).into());
            }
            return Ok(Flow::Next);
        }

        let prompt = PromptContext::new(field, self.values.get(&field.name));
        loop {
            self.presenter.show_prompt(&prompt);
            let line = self.read_line()?;
            if line.trim().eq_ignore_ascii_case("exit") {
                return Err("run aborted by user".into());
            }
            match crate::wizard::parse_answer(field, &line) {
                Ok(Answer::Back) if in_wizard => return Ok(Flow::Back),
                Ok(Answer::Back) => self.presenter.show_notice("Nothing to go back to here."),
                Ok(Answer::Value(value)) => {
                    if let Some(error) = validate_value(field, Some(&value)) {
                        self.presenter.show_field_errors(&[error]);
                        continue;
                    }
                    self.values.insert(field.name.clone(), value);
                    return Ok(Flow::Next);
                }
                Ok(Answer::Keep) => {
                    if self.values.contains_key(&field.name) {
                        return Ok(Flow::Next);
                    }
                    if let Some(default) = &field.default_value {
                        self.values.insert(field.name.clone(), default.clone());
                        return Ok(Flow::Next);
                    }
                    if !field.required {
                        return Ok(Flow::Next);
                    }
                    self.presenter.show_parse_error(&AnswerParseError::new(
                        "This field requires an answer.",
                        None,
                    ));
                }
                Err(err) => self.presenter.show_parse_error(&err),
            }
        }
    }

    fn show_evaluated(&self, index: usize) {
        let env = Environment::for_document(self.document, &self.values);
        if let Some(view) = evaluate_sections(self.document, &env).get(index) {
            self.presenter.show_view(view);
        }
    }

    fn read_line(&mut self) -> CliResult<String> {
        print!("> ");
        std::io::Write::flush(&mut std::io::stdout())?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err("input ended before the app was completed".into());
        }
        Ok(line)
    }
}
