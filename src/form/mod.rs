//! Terminal form for entering patient measurements
//!
//! Fields are asked in training column order. An empty answer keeps the
//! default, anything unparsable or out of range is asked again. End of input
//! closes the session.

use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;

use crate::features::ranges::{self, FieldRange};
use crate::features::{Answer, FeatureRecord, Sex};
use crate::model::{load_classifier, Classifier};
use crate::predict::{format_prediction, Predictor};
use crate::{ModelConfig, Result};

pub const TITLE: &str = "Diabetes Risk Prediction";

pub const DESCRIPTION: &str = "This application uses a machine learning model to predict \
the risk of diabetes from the patient measurements below.";

pub const DISCLAIMER: &str = "Built as an exercise in AI prediction models. Results are for \
reference only and do not replace a professional medical diagnosis.";

/// Load the configured model, then run the form over `input`/`output`.
///
/// Nothing is read or written when the model fails to load.
pub fn serve<R: BufRead, W: Write>(config: &ModelConfig, input: R, output: W) -> Result<usize> {
    let predictor = Predictor::new(load_classifier(config)?);
    let count = Form::new(input, output).run(&predictor)?;
    log::info!("Session ended after {} prediction(s)", count);
    Ok(count)
}

/// Interactive prompt flow over any line-based input/output pair
pub struct Form<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Form<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Form { input, output }
    }

    /// Run the form until the user stops or input ends.
    /// Returns the number of predictions made.
    pub fn run<C: Classifier>(&mut self, predictor: &Predictor<C>) -> Result<usize> {
        writeln!(self.output, "{}", TITLE)?;
        writeln!(self.output, "{}", DESCRIPTION)?;
        writeln!(self.output, "───────────────────────────────")?;

        let mut count = 0;
        loop {
            writeln!(self.output, "\nEnter the patient's measurements:")?;
            let Some(record) = self.collect()? else {
                break;
            };

            let prediction = predictor.predict(&record)?;
            write!(self.output, "{}", format_prediction(&record, &prediction))?;
            count += 1;

            if !self.confirm("\nPredict another patient?")? {
                break;
            }
        }

        writeln!(self.output, "\n{}", DISCLAIMER)?;
        Ok(count)
    }

    /// Ask every field once. `None` when input ends before the record is complete.
    pub fn collect(&mut self) -> Result<Option<FeatureRecord>> {
        let Some(age) = self.ask_number("Age (years)", ranges::AGE)? else {
            return Ok(None);
        };
        let Some(sex) = self.ask_choice("Sex", Sex::CHOICES)? else {
            return Ok(None);
        };
        let Some(bmi) = self.ask_number("BMI", ranges::BMI)? else {
            return Ok(None);
        };
        let Some(waist_circumference) =
            self.ask_number("Waist circumference (cm)", ranges::WAIST_CIRCUMFERENCE)?
        else {
            return Ok(None);
        };
        let Some(fasting_blood_glucose) =
            self.ask_number("Fasting blood glucose (mg/dL)", ranges::FASTING_BLOOD_GLUCOSE)?
        else {
            return Ok(None);
        };
        let Some(hba1c) = self.ask_number("HbA1c (%)", ranges::HBA1C)? else {
            return Ok(None);
        };
        let Some(family_history) =
            self.ask_choice("Family history of diabetes?", Answer::CHOICES)?
        else {
            return Ok(None);
        };
        let Some(gestational_diabetes) =
            self.ask_choice("Previous gestational diabetes?", Answer::CHOICES)?
        else {
            return Ok(None);
        };

        Ok(Some(FeatureRecord {
            age,
            sex,
            bmi,
            waist_circumference,
            fasting_blood_glucose,
            hba1c,
            family_history,
            gestational_diabetes,
        }))
    }

    /// Yes/no question defaulting to no
    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        write!(self.output, "{} [y/N]: ", question)?;
        self.output.flush()?;
        Ok(matches!(
            self.read_line()?.as_deref().map(str::parse::<Answer>),
            Some(Ok(Answer::Yes))
        ))
    }

    fn ask_number<T>(&mut self, label: &str, range: FieldRange<T>) -> Result<Option<T>>
    where
        T: FromStr + PartialOrd + Copy + fmt::Display,
    {
        loop {
            write!(
                self.output,
                "{} {} (default {}): ",
                label, range, range.default
            )?;
            self.output.flush()?;

            let Some(answer) = self.read_line()? else {
                return Ok(None);
            };
            if answer.is_empty() {
                return Ok(Some(range.default));
            }

            match answer.parse::<T>() {
                Ok(value) if range.contains(value) => return Ok(Some(value)),
                Ok(_) => self.reject(label, &format!("must be within {}", range))?,
                Err(_) => self.reject(label, &format!("'{}' is not a number", answer))?,
            }
        }
    }

    fn ask_choice<T>(&mut self, label: &str, choices: [T; 2]) -> Result<Option<T>>
    where
        T: FromStr + Copy + fmt::Display,
    {
        loop {
            write!(
                self.output,
                "{} ({}/{}) (default {}): ",
                label, choices[0], choices[1], choices[0]
            )?;
            self.output.flush()?;

            let Some(answer) = self.read_line()? else {
                return Ok(None);
            };
            if answer.is_empty() {
                return Ok(Some(choices[0]));
            }

            match answer.parse::<T>() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => self.reject(
                    label,
                    &format!("choose {} or {}", choices[0], choices[1]),
                )?,
            }
        }
    }

    fn reject(&mut self, label: &str, message: &str) -> Result<()> {
        log::debug!("Rejected answer for {}: {}", label, message);
        writeln!(self.output, "  Invalid value: {}", message)?;
        Ok(())
    }

    /// Next trimmed line, `None` at end of input
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}
