
use std::{ collections::HashMap,
           fmt::{ self, Display, Formatter },
           ops::{ Index, IndexMut } };
use crate::runtime::data_structures::contextual_data::ContextualData;



#[derive(Clone)]
pub enum WordRuntime
{
    Immediate,
    Normal
}


#[derive(Clone)]
pub enum WordType
{
    Native,
    Scripted
}


#[derive(Clone)]
pub enum WordVisibility
{
    Visible,
    Hidden
}


#[derive(Clone)]
pub struct WordInfo
{
    pub name: String,
    pub runtime: WordRuntime,
    pub word_type: WordType,
    pub visibility: WordVisibility,

    pub description: String,
    pub signature: String,

    pub handler_index: usize
}


impl WordInfo
{
    pub fn new() -> WordInfo
    {
        WordInfo
            {
                name: String::new(),
                runtime: WordRuntime::Normal,
                word_type: WordType::Native,
                visibility: WordVisibility::Visible,
                description: String::new(),
                signature: String::new(),
                handler_index: 0
            }
    }
}



type SubDictionary = HashMap<String, WordInfo>;

type DictionaryStack = Vec<SubDictionary>;



pub struct Dictionary
{
    stack: DictionaryStack
}


impl ContextualData for Dictionary
{
    fn mark_context(&mut self)
    {
        self.stack.push(SubDictionary::new());
    }

    fn release_context(&mut self)
    {
        if self.stack.is_empty()
        {
            panic!("Releasing an empty context!");
        }

        if self.stack.len() == 1
        {
            panic!("Releasing last context!");
        }

        let _ = self.stack.pop();
    }
}


impl Index<&String> for Dictionary
{
    type Output = WordInfo;

    fn index(&self, name: &String) -> &Self::Output
    {
        if let Some(found) = self.try_get(name)
        {
            return found;
        }

        panic!("Word {} not found in dictionary!", name);
    }
}


impl IndexMut<&String> for Dictionary
{
    fn index_mut(&mut self, name: &String) -> &mut Self::Output
    {
        if let Some(found) = self.try_get_mut(name)
        {
            return found;
        }

        panic!("Word {} not found in dictionary!", name);
    }
}


impl Display for Dictionary
{
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result
    {
        let merged = self.get_merged();
        let mut max_size = 0;
        let mut visible_words = 0;

        for item in merged.iter()
        {
            let size = item.0.len();

            if max_size < size
            {
                max_size = size;
            }

            if let WordVisibility::Visible = item.1.visibility
            {
                visible_words += 1;
            }
        }

        let mut string_result = format!("{} words defined.\n\n", visible_words);

        let mut keys: Vec<&String> = merged.keys().collect();
        keys.sort();

        for key in keys.iter()
        {
            let word = &merged[*key];

            if let WordVisibility::Visible = word.visibility
            {
                string_result = string_result +
                                &format!("{:width$}  {:6}",
                                         key,
                                         word.handler_index,
                                         width = max_size);

                string_result = string_result +
                    {
                        if let WordRuntime::Immediate = word.runtime
                        {
                            "  immediate"
                        }
                        else
                        {
                            "           "
                        }
                    };

                string_result = string_result + &format!("  --  {}\n", word.description);
            }
        }

        write!(formatter, "{}", string_result)
    }
}


impl Dictionary
{
    pub fn new() -> Dictionary
    {
        let mut new_dictionary = Dictionary
            {
                stack: Vec::new()
            };

        new_dictionary.mark_context();

        new_dictionary
    }

    pub fn insert(&mut self, name: String, info: WordInfo)
    {
        let top = self.top_mut();
        let _ = top.insert(name, info);
    }

    pub fn get_merged(&self) -> SubDictionary
    {
        let mut merged = SubDictionary::new();

        for sub_dictionary in self.stack.iter()
        {
            for (name, info) in sub_dictionary.iter()
            {
                let _ = merged.insert(name.clone(), info.clone());
            }
        }

        merged
    }

    pub fn try_get(&self, name: &String) -> Option<&WordInfo>
    {
        for sub_dictionary in self.stack.iter().rev()
        {
            if let Some(found) = sub_dictionary.get(name)
            {
                return Some(found);
            }
        }

        None
    }

    pub fn try_get_mut(&mut self, name: &String) -> Option<&mut WordInfo>
    {
        for sub_dictionary in self.stack.iter_mut().rev()
        {
            if let Some(found) = sub_dictionary.get_mut(name)
            {
                return Some(found);
            }
        }

        None
    }

    fn top(&self) -> &SubDictionary
    {
        if self.stack.is_empty()
        {
            panic!("Reading from an empty context!");
        }

        let index = self.stack.len() - 1;
        &self.stack[index]
    }

    fn top_mut(&mut self) -> &mut SubDictionary
    {
        if self.stack.is_empty()
        {
            panic!("Reading from an empty context!");
        }

        let index = self.stack.len() - 1;
        &mut self.stack[index]
    }
}



#[cfg(test)]
mod tests
{
    use super::*;

    fn word(name: &str) -> WordInfo
    {
        let mut info = WordInfo::new();
        info.name = name.to_string();
        info
    }

    #[test]
    fn words_are_visible_as_soon_as_they_are_inserted()
    {
        let mut dictionary = Dictionary::new();
        dictionary.insert("dup".to_string(), word("dup"));

        assert!(dictionary.try_get(&"dup".to_string()).is_some());
        assert!(dictionary.try_get(&"nope".to_string()).is_none());
    }

    #[test]
    fn an_inner_context_shadows_an_outer_definition_of_the_same_name()
    {
        let mut dictionary = Dictionary::new();
        dictionary.insert("x".to_string(), word("outer"));

        dictionary.mark_context();
        dictionary.insert("x".to_string(), word("inner"));

        assert_eq!(dictionary.try_get(&"x".to_string()).unwrap().name, "inner");

        dictionary.release_context();

        assert_eq!(dictionary.try_get(&"x".to_string()).unwrap().name, "outer");
    }

    #[test]
    fn releasing_a_context_removes_words_defined_only_within_it()
    {
        let mut dictionary = Dictionary::new();

        dictionary.mark_context();
        dictionary.insert("local".to_string(), word("local"));
        assert!(dictionary.try_get(&"local".to_string()).is_some());

        dictionary.release_context();
        assert!(dictionary.try_get(&"local".to_string()).is_none());
    }

    #[test]
    fn outer_definitions_survive_releasing_an_unrelated_inner_context()
    {
        let mut dictionary = Dictionary::new();
        dictionary.insert("outer".to_string(), word("outer"));

        dictionary.mark_context();
        dictionary.mark_context();
        dictionary.release_context();

        assert!(dictionary.try_get(&"outer".to_string()).is_some());
    }

    #[test]
    #[should_panic(expected = "Releasing last context!")]
    fn releasing_the_final_context_panics()
    {
        let mut dictionary = Dictionary::new();
        dictionary.release_context();
    }

    #[test]
    fn try_get_mut_edits_the_innermost_matching_definition()
    {
        let mut dictionary = Dictionary::new();
        dictionary.insert("x".to_string(), word("outer"));

        dictionary.mark_context();
        dictionary.insert("x".to_string(), word("inner"));

        dictionary.try_get_mut(&"x".to_string()).unwrap().description = "edited".to_string();

        assert_eq!(dictionary.try_get(&"x".to_string()).unwrap().description, "edited");

        dictionary.release_context();

        assert_eq!(dictionary.try_get(&"x".to_string()).unwrap().description, "");
    }

    #[test]
    fn get_merged_flattens_every_context_with_inner_definitions_winning()
    {
        let mut dictionary = Dictionary::new();
        dictionary.insert("a".to_string(), word("a"));
        dictionary.insert("x".to_string(), word("outer"));

        dictionary.mark_context();
        dictionary.insert("x".to_string(), word("inner"));

        let merged = dictionary.get_merged();

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[&"x".to_string()].name, "inner");
    }

    #[test]
    fn index_operator_panics_for_an_unknown_word()
    {
        let dictionary = Dictionary::new();
        let result = std::panic::catch_unwind(|| { &dictionary[&"missing".to_string()]; });

        assert!(result.is_err());
    }
}
