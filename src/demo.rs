//! The demo flow: greet, summarize two fixed texts, then chain
//! translate-to-math into a TLDR.
//!
//! Only final results are written to `out`; the intermediate translation is
//! never printed.

use crate::{Kernel, Result};
use std::io::Write;

pub const SUMMARIZE_PROMPT: &str = "{{$input}}

One line TLDR with the fewest words.";

pub const TRANSLATION_PROMPT: &str = "{{$input}}

Translate the text to math.";

pub const TLDR_PROMPT: &str = "{{$input}}

Give me a TLDR with the fewest words.";

pub const THERMODYNAMICS: &str = "\
1st Law of Thermodynamics - Energy cannot be created or destroyed.
2nd Law of Thermodynamics - For a spontaneous process, the entropy of the universe increases.
3rd Law of Thermodynamics - A perfect crystal at zero Kelvin has zero entropy.";

pub const NEWTON: &str = "\
1. An object at rest remains at rest, and an object in motion remains in motion at constant speed and in a straight line unless acted on by an unbalanced force.
2. The acceleration of an object depends on the mass of the object and the amount of force applied.
3. Whenever one object exerts a force on another object, the second object exerts an equal and opposite on the first.";

/// Run the demo against `kernel`, writing one result per line to `out`.
///
/// Stops at the first failing call and returns its error.
pub async fn run_demo(kernel: &mut Kernel, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Hello, World!")?;

    // Prompts
    let summarize = kernel.create_semantic_function(SUMMARIZE_PROMPT)?;
    writeln!(out, "{}", kernel.invoke(&summarize, THERMODYNAMICS).await?)?;
    writeln!(out, "{}", kernel.invoke(&summarize, NEWTON).await?)?;

    // Prompt chaining
    let translator = kernel.create_semantic_function(TRANSLATION_PROMPT)?;
    let tldr = kernel.create_semantic_function(TLDR_PROMPT)?;
    let output = kernel
        .run(THERMODYNAMICS, &[translator.as_ref(), tldr.as_ref()])
        .await?;
    writeln!(out, "{}", output)?;
    out.flush()?;

    Ok(())
}
