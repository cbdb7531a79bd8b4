//! Android (Kotlin, JUnit, Jetpack Compose, Cucumber) templates

use super::Templates;

pub fn templates() -> Templates {
    Templates {
        unit_guidance: UNIT_GUIDANCE,
        compose_guidance: COMPOSE_GUIDANCE,
        bdd_guidance: BDD_GUIDANCE,
        refine_guidance: REFINE_GUIDANCE,
        config: CONFIG,
    }
}

pub const UNIT_GUIDANCE: &str = r#"- Write the tests in Kotlin
- Follow best practices for unit testing
- Generate comprehensive tests covering edge cases
- Each test method should test one specific scenario
- Use descriptive test method names following the pattern `should[ExpectedBehavior]When[Condition]`

The test class must include:
- A package declaration matching the class under test
- All necessary imports
- The test class with appropriate annotations
- Setup and teardown methods if needed
- Comprehensive test methods annotated with @Test"#;

pub const COMPOSE_GUIDANCE: &str = r#"- Write the tests in Kotlin
- Use ONLY Jetpack Compose UI testing (androidx.compose.ui.test)
- DO NOT use Espresso; use Compose testing exclusively
- Annotate the class with @RunWith(AndroidJUnit4::class)
- Use descriptive test method names following the pattern `should[ExpectedBehavior]When[Condition]`

Jetpack Compose testing:
- Use a ComposeTestRule (createComposeRule() or createAndroidComposeRule())
- Find nodes with onNodeWithTag, onNodeWithText or onNodeWithContentDescription
- Assert with assertExists(), assertIsDisplayed(), assertTextEquals() and assertIsEnabled()
- Act with performClick(), performTextInput() and performScrollTo()
- For navigation, verify composables appear and disappear
- Use waitUntil for async operations

Example:
```kotlin
@get:Rule
val composeTestRule = createComposeRule()

@Test
fun shouldShowSuccessWhenButtonClicked() {
    composeTestRule.setContent {
        MyComposable()
    }
    composeTestRule.onNodeWithTag("button").performClick()
    composeTestRule.onNodeWithText("Success").assertIsDisplayed()
}
```"#;

pub const BDD_GUIDANCE: &str = r#"- Use the Cucumber framework for Android
- Use ONLY Jetpack Compose UI testing (androidx.compose.ui.test)
- DO NOT use Espresso; use Compose testing exclusively
- Write scenarios in Given-When-Then form

Feature file guidelines:
- Use proper Gherkin syntax (Feature, Scenario, Given, When, Then)
- Create realistic scenarios based on the project's components
- Cover several use cases with descriptive scenario names
- Add Background steps if needed

Step definitions guidelines:
- Import the Cucumber annotations (@Given, @When, @Then)
- Declare the ComposeTestRule as a lateinit var and initialize it in a @Before method
- Launch composables with composeTestRule.setContent { }
- Use semantic finders and Compose assertions for every UI interaction
- Keep scenario state in class properties

Example step definitions:
```kotlin
@Given("I am on the login screen")
fun iAmOnTheLoginScreen() {
    composeTestRule.setContent {
        LoginScreen()
    }
}

@When("I enter email {string}")
fun iEnterEmail(email: String) {
    composeTestRule.onNodeWithTag("email_field").performTextInput(email)
}
```

Test runner guidelines:
- Use @RunWith(CucumberAndroidJUnitRunner::class) with @CucumberOptions
- Point `features` at the "features" asset directory and `glue` at the step definitions package
- No test methods are needed; Cucumber discovers the scenarios"#;

pub const REFINE_GUIDANCE: &str = r#"- Understand the user's request
- Modify the test code accordingly
- Maintain testing best practices
- Keep the same package and imports unless the request says otherwise
- Return the complete modified file, not a fragment"#;

pub const CONFIG: &str = r#"# aitestgen configuration

[provider]
# gemini | openai | ollama
kind = "gemini"
gemini_model = "gemini-2.5-flash"
openai_model = "gpt-4o"
ollama_model = "qwen-32k:latest"
gemini_url = "https://generativelanguage.googleapis.com/v1/models"
openai_url = "https://api.openai.com/v1/chat/completions"
ollama_url = "http://localhost:11434"
timeout_seconds = 60

[generation]
# junit5 | junit4
test_framework = "junit5"
# mockk | mockito
mocking_library = "mockk"
temperature = 0.3
max_tokens = 8000
use_bdd = false
max_context_files = 10

[layout]
unit_test_root = "app/src/test/java"
instrumentation_test_root = "app/src/androidTest/java"
features_dir = "app/src/androidTest/assets/features"

[behavior]
stream_output = true
confirm_writes = true
"#;
